//! Command dispatch.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use vv_core::config::{default_config_path, default_data_dir, load_config, ClientConfig};
use vv_core::gateway::{ApiClient, CredentialStore};
use vv_core::state::StudioStore;
use vv_core::sync::{RunFollower, RunSync};
use vv_core::transport::{SocketEvent, WsConnector};
use vv_protocol::api_models::{CreateRunRequest, PageRequest};
use vv_protocol::prompt_models::{ParameterOverrides, PromptDraft};
use vv_protocol::run_models::Run;

use crate::cli::{
    Cli, Command, HistoryCommand, PageArgs, PromptCommand, RunCommand, SettingKey,
    SettingsCommand,
};
use crate::render;

/// Shortest auto-save period, whatever the settings say.
const MIN_AUTO_SAVE_INTERVAL: Duration = Duration::from_secs(1);

/// Everything a command needs, resolved from flags, files and environment.
struct Context {
    config: ClientConfig,
    config_path: PathBuf,
    data_dir: PathBuf,
    json: bool,
}

impl Context {
    async fn resolve(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .or_else(default_config_path)
            .unwrap_or_else(|| PathBuf::from("studio.toml"));
        let config = load_config(&config_path).await?;

        let data_dir = cli
            .data_dir
            .clone()
            .or_else(default_data_dir)
            .ok_or_else(|| eyre!("Cannot determine a data directory; pass --data-dir"))?;

        Ok(Self {
            config,
            config_path,
            data_dir,
            json: cli.json,
        })
    }

    fn store(&self) -> StudioStore {
        StudioStore::open(&self.data_dir)
    }

    fn api(&self) -> ApiClient {
        ApiClient::new(&self.config, CredentialStore::new(&self.data_dir))
    }

    fn run_sync(&self) -> RunSync {
        RunSync::new(self.config.clone(), self.api(), Arc::new(WsConnector))
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::resolve(&cli).await?;
    tracing::debug!(api_url = %ctx.config.api_url, data_dir = %ctx.data_dir.display(), "resolved context");

    match cli.command {
        Command::Login { email, password } => {
            let session = ctx.api().login(&email, &password).await?;
            if ctx.json {
                render::json(&session.user)?;
            } else {
                println!("Logged in as {}", session.user.email);
            }
            Ok(())
        }
        Command::Logout => {
            ctx.api().logout().await?;
            println!("Logged out");
            Ok(())
        }
        Command::Prompts(command) => prompts(&ctx, command).await,
        Command::Runs(command) => runs(&ctx, command).await,
        Command::History(command) => history(&ctx, command),
        Command::Settings(command) => settings(&ctx, command),
        Command::Config => {
            if ctx.json {
                render::json(&json!({
                    "configPath": ctx.config_path,
                    "dataDir": ctx.data_dir,
                    "config": ctx.config,
                }))
            } else {
                render::config(&ctx.config, &ctx.config_path, &ctx.data_dir);
                Ok(())
            }
        }
    }
}

fn page(args: PageArgs) -> PageRequest {
    PageRequest {
        page: args.page,
        limit: args.limit,
    }
}

async fn prompts(ctx: &Context, command: PromptCommand) -> Result<()> {
    let api = ctx.api();
    match command {
        PromptCommand::List(args) => {
            let prompts = api.list_prompts(page(args)).await?;
            if ctx.json {
                return render::json(&prompts);
            }
            render::prompt_page(&prompts);
        }
        PromptCommand::Show { id } => {
            let prompt = api.get_prompt(&id).await?;
            if ctx.json {
                return render::json(&prompt);
            }
            render::prompt_details(&prompt);
        }
        PromptCommand::Create { text, tags, public } => {
            let draft = PromptDraft {
                tags: (!tags.is_empty()).then_some(tags),
                is_public: Some(public),
                ..PromptDraft::from_text(text)
            };
            let prompt = api.create_prompt(&draft).await?;

            let mut store = ctx.store();
            store.set_current_prompt(Some(prompt.clone()));
            store.add_to_prompt_history(prompt.clone());
            store.flush()?;

            if ctx.json {
                return render::json(&prompt);
            }
            println!("Created prompt {}", prompt.id);
        }
        PromptCommand::Update {
            id,
            text,
            tags,
            public,
        } => {
            let draft = PromptDraft {
                text,
                tags: (!tags.is_empty()).then_some(tags),
                is_public: public,
                ..PromptDraft::default()
            };
            let prompt = api.update_prompt(&id, &draft).await?;
            if ctx.json {
                return render::json(&prompt);
            }
            render::prompt_details(&prompt);
        }
        PromptCommand::Delete { id } => {
            api.delete_prompt(&id).await?;
            println!("Deleted prompt {id}");
        }
    }
    Ok(())
}

async fn runs(ctx: &Context, command: RunCommand) -> Result<()> {
    let sync = ctx.run_sync();
    let api = sync.api();

    match command {
        RunCommand::List(args) => {
            let runs = api.list_runs(page(args)).await?;
            if ctx.json {
                return render::json(&runs);
            }
            render::run_page(&runs);
        }
        RunCommand::Show { id } => {
            let run = api.get_run(&id).await?;
            if ctx.json {
                return render::json(&run);
            }
            render::run_details(&run);
        }
        RunCommand::Create {
            prompt_id,
            quality,
            format,
            follow,
        } => {
            let mut store = ctx.store();
            let overrides = ParameterOverrides {
                quality: Some(match quality {
                    Some(value) => parse_enum(&value)?,
                    None => store.settings().default_quality,
                }),
                export_format: Some(match format {
                    Some(value) => parse_enum(&value)?,
                    None => store.settings().default_export_format,
                }),
                ..ParameterOverrides::default()
            };
            let request = CreateRunRequest {
                parameters: Some(overrides),
                ..CreateRunRequest::for_prompt(prompt_id)
            };

            if follow {
                let mut follower = sync
                    .start(&mut store, &request)
                    .await
                    .map_err(|err| eyre!("{err:#}"))?;
                finish(ctx, &mut follower, &mut store).await?;
            } else {
                let run = api.create_run(&request).await?;
                store.track_run(run);
                show_current(ctx, &store)?;
            }
        }
        RunCommand::Cancel { id } => {
            let run = api.cancel_run(&id).await?;
            if ctx.json {
                return render::json(&run);
            }
            render::run_details(&run);
        }
        RunCommand::Retry { id, follow } => {
            let run = api.retry_run(&id).await?;
            if follow {
                let mut store = ctx.store();
                let mut follower = sync.attach(&mut store, run);
                finish(ctx, &mut follower, &mut store).await?;
            } else if ctx.json {
                return render::json(&run);
            } else {
                render::run_details(&run);
            }
        }
        RunCommand::Watch { id } => {
            let mut store = ctx.store();
            let mut follower = sync
                .follow(&mut store, &id)
                .await
                .map_err(|err| eyre!("{err:#}"))?;
            finish(ctx, &mut follower, &mut store).await?;
        }
    }
    Ok(())
}

fn show_current(ctx: &Context, store: &StudioStore) -> Result<()> {
    let run = store
        .current_run()
        .ok_or_else(|| eyre!("No current run"))?;
    if ctx.json {
        return render::json(run);
    }
    render::run_details(run);
    Ok(())
}

/// Follow a run to the end, printing progress and auto-saving studio state.
async fn finish(ctx: &Context, follower: &mut RunFollower, store: &mut StudioStore) -> Result<()> {
    let max_attempts = ctx.config.max_reconnect_attempts;
    let auto_save = store.settings().auto_save;
    let period = Duration::from_millis(store.settings().auto_save_interval).max(MIN_AUTO_SAVE_INTERVAL);
    let mut autosave = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

    loop {
        tokio::select! {
            event = follower.recv() => {
                let Some(event) = event else { break };
                follower.apply(store, &event).await;
                match &event {
                    SocketEvent::Message(message) if message.run_id() == follower.run_id() => {
                        if !ctx.json {
                            if let Some(run) = store.current_run() {
                                println!("{}", render::progress_line(run));
                            }
                        }
                    }
                    other => render::socket_event(other, max_attempts),
                }
            }
            _ = autosave.tick(), if auto_save => {
                if store.flush()? {
                    tracing::debug!("auto-saved studio state");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                follower.stop().await;
                store.flush()?;
                eprintln!("Stopped following run {}", follower.run_id());
                return Ok(());
            }
        }
    }

    store.flush()?;
    let run: Run = follower.wait(store).await.map_err(|err| eyre!("{err:#}"))?;
    if ctx.json {
        return render::json(&run);
    }
    render::run_details(&run);
    Ok(())
}

fn history(ctx: &Context, command: HistoryCommand) -> Result<()> {
    let mut store = ctx.store();
    match command {
        HistoryCommand::Show => {
            if ctx.json {
                return render::json(&store.prompt_history());
            }
            render::prompt_history(store.prompt_history());
        }
        HistoryCommand::Clear => {
            store.clear_prompt_history();
            store.flush()?;
            println!("Prompt history cleared");
        }
    }
    Ok(())
}

fn settings(ctx: &Context, command: SettingsCommand) -> Result<()> {
    let mut store = ctx.store();
    match command {
        SettingsCommand::Show => {}
        SettingsCommand::Set { key, value } => {
            apply_setting(&mut store, key, &value)?;
            store.flush()?;
        }
        SettingsCommand::Reset => {
            store.reset();
            store.flush()?;
        }
    }

    if ctx.json {
        return render::json(&json!({
            "settings": store.settings(),
            "ui": store.ui(),
        }));
    }
    render::settings(store.settings(), store.ui());
    Ok(())
}

fn apply_setting(store: &mut StudioStore, key: SettingKey, value: &str) -> Result<()> {
    let invalid = |expected: &str| eyre!("Invalid value {value:?} for {key:?}: expected {expected}");

    match key {
        SettingKey::AutoSave => {
            let enabled: bool = value.parse().map_err(|_| invalid("true or false"))?;
            store.update_settings(|s| s.auto_save = enabled);
        }
        SettingKey::AutoSaveInterval => {
            let ms: u64 = value.parse().map_err(|_| invalid("milliseconds"))?;
            store.update_settings(|s| s.auto_save_interval = ms);
        }
        SettingKey::MaxHistorySize => {
            let size: usize = value.parse().map_err(|_| invalid("a number"))?;
            store.update_settings(|s| s.max_history_size = size);
        }
        SettingKey::DefaultQuality => {
            let quality = parse_enum(value)?;
            store.update_settings(|s| s.default_quality = quality);
        }
        SettingKey::DefaultExportFormat => {
            let format = parse_enum(value)?;
            store.update_settings(|s| s.default_export_format = format);
        }
        SettingKey::Theme => {
            let theme = parse_enum(value)?;
            store.update_ui(|ui| ui.theme = theme);
        }
    }
    Ok(())
}

/// Parse a lowercase wire name (`high`, `glb`, `dark`) into a protocol enum.
fn parse_enum<T: serde::de::DeserializeOwned>(value: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
        .map_err(|_| eyre!("Unknown value {value:?}"))
}
