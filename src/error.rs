use thiserror::Error;

pub type HookResult<T, E = HookError> = Result<T, E>;

#[derive(Error, Debug)]
pub enum HookError {
    #[error(transparent)]
    TemplateError(#[from] TemplateError),
    #[error(transparent)]
    RegistryError(#[from] RegistryError),
    #[error(transparent)]
    TriggerError(#[from] TriggerError),
    #[error(transparent)]
    InterfaceError(#[from] InterfaceError),

    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
    #[cfg(feature = "yaml")]
    #[error(transparent)]
    YamlError(#[from] serde_yaml::Error),
    #[cfg(feature = "toml")]
    #[error(transparent)]
    TomlError(#[from] toml::de::Error),
    #[cfg(feature = "default-http-client")]
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error(transparent)]
    BoxError(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("{0}")]
    Parse(String),
    #[error("missing value for placeholder `{0}`")]
    MissingPlaceholder(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("template `{0}` is not found")]
    TemplateNotFound(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriggerError {
    #[error("template `{0}` is not found")]
    TemplateNotFound(String),
    #[error(transparent)]
    Template(#[from] TemplateError),
}
impl From<RegistryError> for TriggerError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::TemplateNotFound(id) => Self::TemplateNotFound(id),
        }
    }
}
impl TriggerError {
    /// Status a front end answers with, `404` for an unknown template and `400` for a template that cannot be rendered.
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            Self::TemplateNotFound(_) => http::StatusCode::NOT_FOUND,
            Self::Template(_) => http::StatusCode::BAD_REQUEST,
        }
    }

    pub fn missing_placeholder(&self) -> Option<&str> {
        match self {
            Self::Template(TemplateError::MissingPlaceholder(name)) => Some(name),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum InterfaceError {
    #[error("`{0}` is unknown extension format")]
    UnknownFormatExtension(String),
    #[error("cannot specify format")]
    CannotSpecifyFormat,
    #[error("should be KEY=VALUE format, but `{0}` has no `=`")]
    KeyValueFormat(String),
    #[error("should be Key:Value format, but `{0}` has no `:`")]
    HeaderFormat(String),
    #[error("environment variable `{0}` has invalid value `{1}`")]
    InvalidEnvironment(String, String),
    #[error("body is not valid json: {0}")]
    InvalidJsonBody(#[source] serde_json::Error),
    #[error("template `{0}` is found by neither id nor name")]
    UnresolvedTemplate(String),
    #[error("service responded {0}: {1}")]
    ServiceStatus(u16, String),
}
