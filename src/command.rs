use std::{
    io::{BufRead, Write},
    net::SocketAddr,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Args, Parser, Subcommand};
use reqwest::{header::CONTENT_TYPE, Method, StatusCode};
use serde_json::Value;

use crate::{
    config::Config,
    dispatch::{
        client::APP_USER_AGENT,
        request::{default_body, default_method, WebhookRequest},
    },
    error::{HookResult, InterfaceError},
    registry::{TemplateDraft, WebhookTemplate},
    trigger::{AdhocTrigger, TemplateTrigger},
};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

pub async fn execute() -> Result<ExitCode, Box<dyn std::error::Error + Send + Sync>> {
    let cmd = Cmd::parse();
    console::set_colors_enabled(!cmd.no_color);
    Ok(cmd.run(&mut std::io::stdout(), &mut std::io::stdin().lock()).await?)
}

#[derive(Parser, Debug, Clone, PartialEq)]
#[clap(version, about, arg_required_else_help = true)]
pub struct Cmd {
    #[clap(subcommand)]
    pub subcommand: SubCommands,

    /// base url of a running service
    #[arg(long, global = true, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// without colorize output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum SubCommands {
    /// run the http service
    Serve(Serve),

    /// serve the trigger tools over MCP on stdio
    Mcp(Mcp),

    /// manage webhook templates
    #[command(subcommand)]
    Templates(TemplatesCommand),

    /// send webhooks without templates
    #[command(subcommand)]
    Webhooks(WebhooksCommand),
}

#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct Serve {
    /// config file (json, yaml or toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// override listen address
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct Mcp {
    /// config file (json, yaml or toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum TemplatesCommand {
    /// list all templates
    List,

    /// show a template
    Get { id_or_name: String },

    /// register a template
    Create(CreateTemplate),

    /// remove a template
    Delete {
        id_or_name: String,

        /// skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// fill a template with values and send it
    Trigger {
        id_or_name: String,

        /// placeholder value
        #[arg(short = 'v', long = "value", value_parser = parse_key_value::<String, String>)]
        values: Vec<(String, String)>,

        /// return without waiting for the response of the target
        #[arg(long = "async")]
        asynchronous: bool,
    },
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct CreateTemplate {
    #[arg(short, long)]
    pub name: String,

    /// url, may contain {placeholder}
    #[arg(short, long)]
    pub url: String,

    #[arg(short, long, default_value_t = default_method())]
    pub method: String,

    /// header, value may contain {placeholder}
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// json body, string leaves may contain {placeholder}
    #[arg(short, long, value_parser = parse_json)]
    pub body: Option<Value>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum WebhooksCommand {
    /// send a one-off webhook
    Adhoc(Adhoc),
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct Adhoc {
    #[arg(short, long)]
    pub url: String,

    #[arg(short, long, default_value_t = default_method())]
    pub method: String,

    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// json body
    #[arg(short, long, value_parser = parse_json)]
    pub body: Option<Value>,

    /// return without waiting for the response of the target
    #[arg(long = "async")]
    pub asynchronous: bool,
}

pub fn parse_key_value<T, U>(s: &str) -> Result<(T, U), Box<dyn std::error::Error + Send + Sync + 'static>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    U: std::str::FromStr,
    U::Err: std::error::Error + Send + Sync + 'static,
{
    let (key, value) = s.split_once('=').ok_or_else(|| InterfaceError::KeyValueFormat(s.to_string()))?;
    Ok((key.parse()?, value.parse()?))
}
pub fn parse_header(s: &str) -> Result<(String, String), InterfaceError> {
    let (name, value) = s.split_once(':').ok_or_else(|| InterfaceError::HeaderFormat(s.to_string()))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}
pub fn parse_json(s: &str) -> Result<Value, InterfaceError> {
    serde_json::from_str(s).map_err(InterfaceError::InvalidJsonBody)
}

impl Cmd {
    pub async fn run<W: Write, R: BufRead>(&self, out: &mut W, input: &mut R) -> HookResult<ExitCode> {
        match &self.subcommand {
            SubCommands::Serve(serve) => {
                crate::server::serve(serve.config()?).await?;
                Ok(ExitCode::SUCCESS)
            }
            SubCommands::Mcp(mcp) => {
                crate::mcp::serve_stdio(load_config(mcp.config.as_deref())?).await?;
                Ok(ExitCode::SUCCESS)
            }
            SubCommands::Templates(templates) => templates.run(&ApiClient::new(&self.api_url)?, out, input).await,
            SubCommands::Webhooks(webhooks) => webhooks.run(&ApiClient::new(&self.api_url)?, out).await,
        }
    }
}

/// environment > file > default
pub fn load_config(path: Option<&Path>) -> HookResult<Config> {
    match path {
        Some(path) => Config::read(path)?,
        None => Config::default(),
    }
    .environment()
}

impl Serve {
    /// command line > environment > file > default
    pub fn config(&self) -> HookResult<Config> {
        let config = load_config(self.config.as_deref())?;
        Ok(Config { bind: self.bind.unwrap_or(config.bind), ..config })
    }
}

impl TemplatesCommand {
    pub async fn run<W: Write, R: BufRead>(&self, api: &ApiClient, out: &mut W, input: &mut R) -> HookResult<ExitCode> {
        match self {
            Self::List => api.call(Method::GET, "/templates", None).await?.print(out),
            Self::Get { id_or_name } => {
                let template = api.resolve(id_or_name).await?;
                Reply { status: StatusCode::OK, body: serde_json::to_value(template)? }.print(out)
            }
            Self::Create(create) => {
                let body = serde_json::to_value(create.draft())?;
                api.call(Method::POST, "/templates", Some(body)).await?.print(out)
            }
            Self::Delete { id_or_name, yes } => {
                let template = api.resolve(id_or_name).await?;
                let prompt = format!("delete template `{}` ({})?", template.name, template.id);
                if !yes && !confirm(out, input, &prompt)? {
                    writeln!(out, "canceled")?;
                    return Ok(ExitCode::SUCCESS);
                }
                api.call(Method::DELETE, &format!("/templates/{}", template.id), None).await?.print(out)
            }
            Self::Trigger { id_or_name, values, asynchronous } => {
                let template = api.resolve(id_or_name).await?;
                let payload = TemplateTrigger {
                    template_id: template.id,
                    values: values.iter().cloned().collect(),
                    wait_for_response: !asynchronous,
                };
                let body = serde_json::to_value(payload)?;
                api.call(Method::POST, "/webhooks/trigger/template", Some(body)).await?.print(out)
            }
        }
    }
}

impl CreateTemplate {
    pub fn draft(&self) -> TemplateDraft {
        TemplateDraft {
            name: self.name.clone(),
            method: self.method.clone(),
            url_template: self.url.clone(),
            headers_template: self.headers.iter().cloned().collect(),
            body_template: self.body.clone().unwrap_or_else(default_body),
        }
    }
}

impl WebhooksCommand {
    pub async fn run<W: Write>(&self, api: &ApiClient, out: &mut W) -> HookResult<ExitCode> {
        match self {
            Self::Adhoc(adhoc) => {
                let body = serde_json::to_value(adhoc.trigger())?;
                api.call(Method::POST, "/webhooks/trigger/adhoc", Some(body)).await?.print(out)
            }
        }
    }
}

impl Adhoc {
    pub fn trigger(&self) -> AdhocTrigger {
        let request = WebhookRequest {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.iter().cloned().collect(),
            body: self.body.clone().unwrap_or_else(default_body),
        };
        AdhocTrigger { request, wait_for_response: !self.asynchronous }
    }
}

pub fn confirm<W: Write, R: BufRead>(out: &mut W, input: &mut R, prompt: &str) -> HookResult<bool> {
    write!(out, "{} [y/N] ", prompt)?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Client of the http front end.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base: String,
}
impl ApiClient {
    pub fn new(base: &str) -> HookResult<Self> {
        let client = reqwest::Client::builder().user_agent(APP_USER_AGENT).build()?;
        Ok(Self { client, base: base.trim_end_matches('/').to_string() })
    }

    pub async fn call(&self, method: Method, path: &str, body: Option<Value>) -> HookResult<Reply> {
        let mut request = self.client.request(method, format!("{}{}", self.base, path));
        if let Some(json) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(serde_json::to_vec(&json)?);
        }
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
        };
        Ok(Reply { status, body })
    }

    /// Looks a template up by id, then by the first template with that name.
    ///
    /// Only an argument shaped like an id is sent as a path segment, names may be anything.
    pub async fn resolve(&self, id_or_name: &str) -> HookResult<WebhookTemplate> {
        if let Ok(id) = uuid::Uuid::parse_str(id_or_name) {
            let by_id = self.call(Method::GET, &format!("/templates/{}", id.hyphenated()), None).await?;
            if by_id.status.is_success() {
                return Ok(serde_json::from_value(by_id.body)?);
            } else if by_id.status != StatusCode::NOT_FOUND {
                return Err(by_id.into_error().into());
            }
        }

        let listed = self.call(Method::GET, "/templates", None).await?;
        if !listed.status.is_success() {
            return Err(listed.into_error().into());
        }
        let templates: Vec<WebhookTemplate> = serde_json::from_value(listed.body)?;
        match templates.into_iter().find(|t| t.name == id_or_name) {
            Some(template) => Ok(template),
            None => Err(InterfaceError::UnresolvedTemplate(id_or_name.to_string()))?,
        }
    }
}

pub const SUCCESS_EMOJI: console::Emoji<'_, '_> = console::Emoji("✅", "OK");
pub const FAILURE_EMOJI: console::Emoji<'_, '_> = console::Emoji("❌", "NG");

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}
impl Reply {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn into_error(self) -> InterfaceError {
        InterfaceError::ServiceStatus(self.status.as_u16(), self.body.to_string())
    }

    pub fn print<W: Write>(&self, out: &mut W) -> HookResult<ExitCode> {
        let mut line = self.status.to_string();
        if let Some(webhook_status) = self.body.get("webhook_status").and_then(Value::as_str) {
            line = format!("{} {}", line, webhook_status);
        }
        if self.is_success() {
            writeln!(out, "{} {}", SUCCESS_EMOJI, console::style(line).green())?;
        } else {
            writeln!(out, "{} {}", FAILURE_EMOJI, console::style(line).red())?;
        }
        if !self.body.is_null() {
            writeln!(out, "{}", serde_json::to_string_pretty(&self.body)?)?;
        }
        Ok(if self.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
    }
}
