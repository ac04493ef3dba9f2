use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};

pub mod backgrounds;
pub mod compose;
pub mod deck;
pub mod fonts;
pub mod layout;
pub mod logging;
mod paths;
pub mod providers;
pub mod publish;
pub mod render;
pub mod server;
pub mod settings;
pub mod variants;

#[derive(Debug, Clone)]
pub struct Config {
    pub settings_path: Option<String>,
    pub command: Command,
}

#[derive(Debug, Clone)]
pub enum Command {
    Compose {
        script: String,
        backgrounds_dir: String,
        out_dir: String,
        seed: Option<u64>,
    },
    Backgrounds {
        out_dir: String,
        provider: Option<String>,
        key: Option<String>,
        prompts_file: Option<String>,
    },
    Publish {
        script: String,
        slides_dir: String,
        schedule: Option<String>,
        token: Option<String>,
    },
    Serve {
        addr: String,
    },
}

pub async fn run(config: Config) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;

    match config.command {
        Command::Compose {
            script,
            backgrounds_dir,
            out_dir,
            seed,
        } => {
            let deck = deck::load_deck(Path::new(&script))?;
            let mut picker = variants::build_picker(seed);
            let written = compose::compose_deck(
                &deck,
                Path::new(&backgrounds_dir),
                Path::new(&out_dir),
                picker.as_mut(),
                &settings,
            )?;
            let mut lines = Vec::with_capacity(written.len() + 1);
            for path in &written {
                lines.push(path.display().to_string());
            }
            lines.push(format!("{} slides composed", written.len()));
            Ok(lines.join("\n"))
        }
        Command::Backgrounds {
            out_dir,
            provider,
            key,
            prompts_file,
        } => {
            let prompts = resolve_prompts(prompts_file.as_deref(), &settings)?;
            let provider_arg = provider.or_else(|| settings.background_provider.clone());
            let selection =
                providers::resolve_provider_selection(provider_arg.as_deref(), key.as_deref())?;
            let resolved_key = providers::resolve_key(selection.provider, key.as_deref())
                .with_context(|| "no API key found for selected provider")?;
            let built = providers::build_provider(
                selection.provider,
                resolved_key,
                selection.requested_model,
            );
            let (width, height) = backgrounds::parse_size(&settings.background_size)?;
            let written = backgrounds::generate_backgrounds(
                &built,
                &prompts,
                width,
                height,
                Path::new(&out_dir),
            )
            .await?;
            Ok(format!(
                "{} backgrounds written to {}",
                written.len(),
                out_dir
            ))
        }
        Command::Publish {
            script,
            slides_dir,
            schedule,
            token,
        } => {
            let deck = deck::load_deck(Path::new(&script))?;
            let slides = collect_slides(Path::new(&slides_dir))?;
            if slides.len() != deck.slides.len() {
                return Err(anyhow!(
                    "deck has {} slides but {} composed files found in {} (run compose first?)",
                    deck.slides.len(),
                    slides.len(),
                    slides_dir
                ));
            }
            let client = publish::SchedulerClient::from_settings(&settings, token.as_deref())?;
            let scheduled_at = publish::parse_schedule(schedule.as_deref())?;
            let post =
                publish::publish_slides(&client, &slides, &deck, &settings, scheduled_at).await?;
            Ok(format!(
                "post {} {} with {} slides",
                post.id,
                post.status,
                slides.len()
            ))
        }
        Command::Serve { addr } => {
            server::run_server(settings, addr).await?;
            Ok(String::new())
        }
    }
}

fn resolve_prompts(
    prompts_file: Option<&str>,
    settings: &settings::Settings,
) -> Result<Vec<String>> {
    if let Some(path) = prompts_file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read prompts file: {}", path))?;
        let prompts: Vec<String> = content
            .lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| line.to_string())
            .collect();
        if prompts.is_empty() {
            return Err(anyhow!("prompts file {} has no prompts", path));
        }
        return Ok(prompts);
    }
    if settings.background_prompts.is_empty() {
        return Err(anyhow!(
            "no prompts given (pass --prompts or set [backgrounds] prompts in settings)"
        ));
    }
    Ok(settings.background_prompts.clone())
}

fn collect_slides(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read slides directory: {}", dir.display()))?;
    let mut slides = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| "failed to read directory entry")?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if name.starts_with("slide-") && name.ends_with(".png") {
            slides.push(path);
        }
    }
    if slides.is_empty() {
        return Err(anyhow!("no slide-*.png files in {}", dir.display()));
    }
    slides.sort();
    Ok(slides)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_slides_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["slide-02.png", "slide-01.png", "notes.txt", "bg-01.png"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let slides = collect_slides(dir.path()).unwrap();
        let names: Vec<_> = slides
            .iter()
            .map(|path| path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["slide-01.png", "slide-02.png"]);
    }

    #[test]
    fn collect_slides_requires_at_least_one() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_slides(dir.path()).is_err());
    }

    #[test]
    fn prompts_file_strips_comments_and_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts.txt");
        std::fs::write(&path, "# comment\n\nwarm desk\n  night gallery  \n").unwrap();
        let prompts =
            resolve_prompts(Some(path.to_str().unwrap()), &settings::Settings::default()).unwrap();
        assert_eq!(prompts, vec!["warm desk", "night gallery"]);
    }

    #[test]
    fn prompts_fall_back_to_settings() {
        let mut settings = settings::Settings::default();
        settings.background_prompts = vec!["from settings".to_string()];
        let prompts = resolve_prompts(None, &settings).unwrap();
        assert_eq!(prompts, vec!["from settings"]);
    }
}
