use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::paths;
use crate::providers::ImageProvider;

/// Generate one background per prompt into `out_dir` as `bg-NN.png`, reusing
/// previously generated images keyed by an md5 of (prompt, size).
pub async fn generate_backgrounds(
    provider: &dyn ImageProvider,
    prompts: &[String],
    width: u32,
    height: u32,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    if prompts.is_empty() {
        return Err(anyhow!("no background prompts configured"));
    }
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create backgrounds directory: {}", out_dir.display()))?;
    let cache_dir = paths::backgrounds_cache_dir();
    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("failed to create cache directory: {}", cache_dir.display()))?;

    let mut written = Vec::with_capacity(prompts.len());
    for (index, prompt) in prompts.iter().enumerate() {
        let cache_path = cache_dir.join(format!("{}.png", cache_key(prompt, width, height)));
        let bytes = if cache_path.exists() {
            info!("background {} served from cache", index + 1);
            std::fs::read(&cache_path)
                .with_context(|| format!("failed to read cached background: {}", cache_path.display()))?
        } else {
            let image = provider.generate(prompt.clone(), width, height).await?;
            info!("background {} generated with {}", index + 1, image.model);
            std::fs::write(&cache_path, &image.bytes).with_context(|| {
                format!("failed to write background cache: {}", cache_path.display())
            })?;
            image.bytes
        };
        let out_path = out_dir.join(format!("bg-{:02}.png", index + 1));
        std::fs::write(&out_path, &bytes)
            .with_context(|| format!("failed to write background: {}", out_path.display()))?;
        written.push(out_path);
    }
    Ok(written)
}

fn cache_key(prompt: &str, width: u32, height: u32) -> String {
    let seed = format!("{}|{}x{}", prompt.trim(), width, height);
    format!("{:x}", md5::compute(seed.as_bytes()))
}

pub fn parse_size(value: &str) -> Result<(u32, u32)> {
    let (w, h) = value
        .trim()
        .split_once('x')
        .ok_or_else(|| anyhow!("invalid size '{}' (expected WIDTHxHEIGHT)", value))?;
    let width: u32 = w
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid width in size '{}'", value))?;
    let height: u32 = h
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid height in size '{}'", value))?;
    if width == 0 || height == 0 {
        return Err(anyhow!("size '{}' must be non-zero", value));
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{GenerateFuture, GeneratedImage};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
    }

    impl ImageProvider for CountingProvider {
        fn generate(&self, prompt: String, _width: u32, _height: u32) -> GenerateFuture {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                Ok(GeneratedImage {
                    bytes: format!("image-for:{}", prompt).into_bytes(),
                    mime: "image/png".to_string(),
                    model: "test-model".to_string(),
                })
            })
        }
    }

    #[test]
    fn size_parses_and_validates() {
        assert_eq!(parse_size("1024x1792").unwrap(), (1024, 1792));
        assert_eq!(parse_size(" 640 x 384 ").unwrap(), (640, 384));
        assert!(parse_size("1024").is_err());
        assert!(parse_size("0x100").is_err());
        assert!(parse_size("axb").is_err());
    }

    #[test]
    fn cache_key_depends_on_prompt_and_size() {
        let a = cache_key("desk with notes", 1024, 1792);
        let b = cache_key("desk with notes", 512, 896);
        let c = cache_key("other prompt", 1024, 1792);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, cache_key("  desk with notes ", 1024, 1792));
    }

    #[tokio::test]
    async fn second_run_hits_the_cache() {
        let base = tempfile::tempdir().unwrap();
        // point the cache under the temp base dir
        unsafe { std::env::set_var("SLIDESMITH_DIR", base.path()) };
        let out_dir = base.path().join("backgrounds");
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            calls: calls.clone(),
        };
        let prompts = vec!["warm desk".to_string(), "night gallery".to_string()];

        let first = generate_backgrounds(&provider, &prompts, 512, 896, &out_dir)
            .await
            .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(first[0].ends_with("bg-01.png"));
        assert!(first[1].ends_with("bg-02.png"));

        let second = generate_backgrounds(&provider, &prompts, 512, 896, &out_dir)
            .await
            .unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2, "cache miss on second run");
    }

    #[tokio::test]
    async fn empty_prompt_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let provider = CountingProvider {
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let err = generate_backgrounds(&provider, &[], 512, 896, dir.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no background prompts"));
    }
}
