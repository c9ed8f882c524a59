use anyhow::{anyhow, Result};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use redis::AsyncCommands;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use crate::domain::post::Post;
use crate::infra::{cache::RedisCache, storage::ObjectStorage};

/// Durable half of the media flow. The local accept/preview half lives on
/// the draft model; nothing here runs until submit.
#[derive(Clone)]
pub struct MediaService {
    cache: RedisCache,
    storage: ObjectStorage,
    upload_max_bytes: i64,
    media_url_ttl_seconds: u64,
    s3_public_endpoint: Option<String>,
}

impl MediaService {
    pub fn new(
        cache: RedisCache,
        storage: ObjectStorage,
        upload_max_bytes: i64,
        media_url_ttl_seconds: u64,
        s3_public_endpoint: Option<String>,
    ) -> Self {
        Self {
            cache,
            storage,
            upload_max_bytes,
            media_url_ttl_seconds,
            s3_public_endpoint,
        }
    }

    /// Local checks shared by the handler (to reject before any network
    /// call) and `commit` itself.
    pub fn validate_file(&self, content_type: &str, bytes: i64) -> Result<()> {
        extension_from_content_type(content_type)?;
        if bytes == 0 {
            return Err(anyhow!("media file is empty"));
        }
        if bytes > self.upload_max_bytes {
            return Err(anyhow!(
                "media file exceeds the {} byte limit",
                self.upload_max_bytes
            ));
        }
        Ok(())
    }

    /// Single-shot upload under a path scoped to the owner. Returns the
    /// object key stored on the post; any failure here aborts the whole
    /// submit before a post row exists.
    pub async fn commit(
        &self,
        owner_id: Uuid,
        content_type: &str,
        data: Bytes,
    ) -> Result<String> {
        self.validate_file(content_type, data.len() as i64)?;
        let ext = extension_from_content_type(content_type)?;

        let object_key = format!("media/{}/{}.{}", owner_id, Uuid::new_v4(), ext);

        self.storage
            .client()
            .put_object()
            .bucket(self.storage.bucket())
            .key(&object_key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await?;

        Ok(object_key)
    }

    /// Resolves a stored object key to a publicly resolvable URL: presigned
    /// GET, cached in Redis to avoid repeated presign calls, rewritten to
    /// the public endpoint when configured.
    pub async fn media_url(&self, object_key: Option<&str>) -> Option<String> {
        let key = object_key?;
        let cache_key = format!("media-url:{}", key);

        if let Ok(mut conn) = self.cache.connection().await {
            if let Ok(Some(cached)) = conn.get::<_, Option<String>>(&cache_key).await {
                return Some(cached);
            }
        }

        let presign_config =
            PresigningConfig::expires_in(Duration::from_secs(self.media_url_ttl_seconds)).ok()?;

        let presigned = self
            .storage
            .client()
            .get_object()
            .bucket(self.storage.bucket())
            .key(key)
            .presigned(presign_config)
            .await
            .ok()?;

        let mut url = presigned.uri().to_string();
        if let Some(ref public_endpoint) = self.s3_public_endpoint {
            if let Ok(rewritten) = rewrite_presigned_url(&url, public_endpoint) {
                url = rewritten;
            }
        }

        // Cache slightly shorter than the signature lifetime.
        let cache_ttl = self.media_url_ttl_seconds.saturating_sub(300);
        if cache_ttl > 0 {
            if let Ok(mut conn) = self.cache.connection().await {
                let _ = conn.set_ex::<_, _, ()>(&cache_key, &url, cache_ttl).await;
            }
        }

        Some(url)
    }

    /// Fills in `media_url` for every post carrying a media key,
    /// parallelized across the list.
    pub async fn populate_media_urls(&self, posts: &mut [Post]) {
        let futures: Vec<_> = posts
            .iter()
            .enumerate()
            .filter(|(_, post)| post.media_key.is_some())
            .map(|(i, post)| {
                let key = post.media_key.clone();
                async move {
                    let url = self.media_url(key.as_deref()).await;
                    (i, url)
                }
            })
            .collect();

        let results = futures::future::join_all(futures).await;
        for (i, url) in results {
            posts[i].media_url = url;
        }
    }
}

fn extension_from_content_type(content_type: &str) -> Result<&'static str> {
    match content_type {
        "image/jpeg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/webp" => Ok("webp"),
        "image/gif" => Ok("gif"),
        "video/mp4" => Ok("mp4"),
        "video/quicktime" => Ok("mov"),
        "video/webm" => Ok("webm"),
        _ => Err(anyhow!("unsupported content type")),
    }
}

fn rewrite_presigned_url(original: &str, public_endpoint: &str) -> Result<String> {
    let mut original_url = Url::parse(original)?;
    let public_url = if public_endpoint.contains("://") {
        Url::parse(public_endpoint)?
    } else {
        Url::parse(&format!("http://{}", public_endpoint))?
    };

    original_url
        .set_scheme(public_url.scheme())
        .map_err(|_| anyhow!("invalid scheme for public endpoint"))?;
    original_url
        .set_host(public_url.host_str())
        .map_err(|_| anyhow!("invalid host for public endpoint"))?;
    original_url.set_port(public_url.port()).ok();

    Ok(original_url.to_string())
}
