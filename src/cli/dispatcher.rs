use crate::api::client::{DEFAULT_TIMEOUT_SECS, StockroomClient};
use crate::api::models::{EntityId, FileUpload};
use crate::api::resource::{KNOWN_RESOURCES, ResourceApi};
use crate::cli::browse::Browser;
use crate::cli::main_types::{Commands, ConfigCommands, FieldArgs};
use crate::cli::terminal::TerminalNotifier;
use crate::core::form::{EntityForm, SubmitOutcome};
use crate::core::i18n::{Catalog, Translate};
use crate::core::list_controller::{DeleteOutcome, ListController, ListOptions, ListState};
use crate::core::notifier::Notifier;
use crate::display::{TableDisplay, pagination_footer};
use crate::error::{AppError, CliError};
use crate::storage::config::{Config, Profile};
use crate::storage::download::DirectorySink;
use crate::utils::error_helpers::convert_io_error;
use crate::utils::validation::{parse_assignment, validate_resource_name, validate_url};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Global options that shape how every command talks to the API.
#[derive(Debug, Default)]
pub struct DispatchOptions {
    pub profile: Option<String>,
    pub config_path: Option<PathBuf>,
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub assume_yes: bool,
}

pub struct Dispatcher {
    config: Config,
    options: DispatchOptions,
    notifier: Arc<dyn Notifier>,
    translator: Arc<dyn Translate>,
}

impl Dispatcher {
    pub fn new(config: Config, options: DispatchOptions) -> Self {
        let notifier = Arc::new(TerminalNotifier::new(options.assume_yes));
        Self {
            config,
            options,
            notifier,
            translator: Arc::new(Catalog::english()),
        }
    }

    fn profile_name(&self) -> String {
        self.config.active_profile_name(self.options.profile.as_deref())
    }

    fn profile(&self) -> Profile {
        self.config
            .get_profile(&self.profile_name())
            .cloned()
            .unwrap_or_default()
    }

    fn client(&self) -> crate::Result<StockroomClient> {
        let profile = self.profile();
        let api_url = self
            .options
            .api_url
            .clone()
            .unwrap_or_else(|| profile.api_url.clone());
        validate_url(&api_url)?;

        log::debug!("using profile '{}' at {}", self.profile_name(), api_url);

        let client = StockroomClient::with_timeout(
            api_url,
            profile.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS),
        )?;
        Ok(match self.options.token.as_ref().filter(|t| !t.is_empty()) {
            Some(token) => client.with_token(token.clone()),
            None => client,
        })
    }

    fn api(&self, resource: &str) -> crate::Result<Arc<dyn ResourceApi>> {
        validate_resource_name(resource)?;
        if !KNOWN_RESOURCES.contains(&resource) {
            log::warn!("'{}' is not a known resource; sending anyway", resource);
        }
        Ok(Arc::new(self.client()?.resource(resource)))
    }

    fn controller(&self, resource: &str, debounce: Duration) -> crate::Result<ListController> {
        Ok(ListController::new(
            self.api(resource)?,
            self.notifier.clone(),
            self.translator.clone(),
            ListOptions { debounce },
        ))
    }

    pub async fn dispatch(&self, command: Commands) -> crate::Result<()> {
        match command {
            Commands::List {
                resource,
                page,
                search,
            } => self.handle_list(&resource, page, search.as_deref()).await,
            Commands::All { resource } => self.handle_all(&resource).await,
            Commands::Show { resource, id } => self.handle_show(&resource, &id).await,
            Commands::Create { resource, fields } => {
                let form = EntityForm::create(
                    self.api(&resource)?,
                    self.notifier.clone(),
                    self.translator.clone(),
                );
                self.submit_form(form, &fields).await
            }
            Commands::Update {
                resource,
                id,
                fields,
            } => {
                let form = EntityForm::edit(
                    self.api(&resource)?,
                    self.notifier.clone(),
                    self.translator.clone(),
                    EntityId::from(id.as_str()),
                )
                .await?;
                self.submit_form(form, &fields).await
            }
            Commands::Delete { resource, id } => self.handle_delete(&resource, &id).await,
            Commands::Export {
                resource,
                output_dir,
            } => self.handle_export(&resource, output_dir).await,
            Commands::Browse { resource } => {
                let controller = self.controller(&resource, self.profile().search_debounce())?;
                let sink = DirectorySink::new(self.profile().download_dir());
                Browser::new(controller, sink).run().await
            }
            Commands::Config { command } => self.handle_config_command(command),
        }
    }

    async fn handle_list(&self, resource: &str, page: u32, search: Option<&str>) -> crate::Result<()> {
        // one-shot command; nothing to debounce
        let controller = self.controller(resource, Duration::ZERO)?;
        controller.load(page, search.unwrap_or_default()).await?;
        print_list(&controller.snapshot())
    }

    async fn handle_all(&self, resource: &str) -> crate::Result<()> {
        let rows = self.api(resource)?.list().await?;
        println!("{}", TableDisplay::new().render_entities(&rows));
        println!("{} records", rows.len());
        Ok(())
    }

    async fn handle_show(&self, resource: &str, id: &str) -> crate::Result<()> {
        let entity = self.api(resource)?.get_by_id(&EntityId::from(id)).await?;
        println!("{}", TableDisplay::new().render_record(&entity));
        Ok(())
    }

    async fn submit_form(&self, mut form: EntityForm, args: &FieldArgs) -> crate::Result<()> {
        for raw in &args.fields {
            let (key, value) = parse_assignment(raw)?;
            form.set(&key, value);
        }
        for raw in &args.files {
            let (key, path) = parse_assignment(raw)?;
            let path = Path::new(&path);
            let upload = FileUpload::from_path(path).map_err(|e| convert_io_error(e, path))?;
            form.set_file(&key, upload);
        }

        match form.submit().await {
            SubmitOutcome::Saved(entity) => {
                println!("{}", TableDisplay::new().render_record(&entity));
                Ok(())
            }
            SubmitOutcome::Rejected => {
                println!("{}", TableDisplay::new().render_field_errors(form.errors()));
                Err(CliError::CommandFailed("the server rejected the submitted fields".to_string()).into())
            }
            SubmitOutcome::Failed(err) => Err(err),
        }
    }

    async fn handle_delete(&self, resource: &str, id: &str) -> crate::Result<()> {
        let controller = self.controller(resource, Duration::ZERO)?;
        match controller.request_delete(EntityId::from(id)).await? {
            DeleteOutcome::Deleted => Ok(()),
            DeleteOutcome::Cancelled => Err(CliError::Cancelled(format!(
                "{} {} was not deleted (pass --yes when stdin is not a terminal)",
                resource, id
            ))
            .into()),
            DeleteOutcome::InFlight => Err(CliError::CommandFailed(format!(
                "a delete of {} {} is already running",
                resource, id
            ))
            .into()),
            DeleteOutcome::Failed(err) => Err(err),
        }
    }

    async fn handle_export(&self, resource: &str, output_dir: Option<PathBuf>) -> crate::Result<()> {
        let dir = output_dir.unwrap_or_else(|| self.profile().download_dir());
        let controller = self.controller(resource, Duration::ZERO)?;
        let path = controller.export_pdf(&DirectorySink::new(dir)).await?;
        println!("{}", path.display());
        Ok(())
    }

    fn handle_config_command(&self, command: ConfigCommands) -> crate::Result<()> {
        match command {
            ConfigCommands::Show => {
                let name = self.profile_name();
                let profile = self.profile();
                println!("Current Configuration:");
                println!("=====================");
                println!("Profile: {}", name);
                println!("API URL: {}", profile.api_url);
                println!(
                    "Timeout: {}s",
                    profile.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS)
                );
                println!("Search debounce: {}ms", profile.search_debounce().as_millis());
                println!("Download directory: {}", profile.download_dir().display());
                Ok(())
            }
            ConfigCommands::Set { key, value } => {
                let name = self.profile_name();
                let mut config = self.config.clone();
                let mut profile = self.profile();
                profile.set(&key, &value)?;
                config.set_profile(name.clone(), profile);
                if config.default_profile.is_none() {
                    config.default_profile = Some(name.clone());
                }
                config.save(self.options.config_path.clone())?;
                println!("✅ Set {} = {} for profile '{}'", key, value, name);
                Ok(())
            }
        }
    }
}

/// Print the controller's current page, or fail with its error message.
pub fn print_list(state: &ListState) -> crate::Result<()> {
    if let Some(message) = state.status.error() {
        return Err(AppError::Cli(CliError::CommandFailed(message.to_string())));
    }
    if let Some(page) = state.status.data() {
        if !state.query.is_empty() {
            println!("Search: {}", state.query);
        }
        if !page.is_empty() {
            println!("{}", TableDisplay::new().render_entities(&page.data));
        }
        println!("{}", pagination_footer(page));
    }
    Ok(())
}
