//! Selecting one problem out of a parsed source text.

use std::error::Error;
use std::fmt;

use rddl_core::{RandomSource, ValidationErrors};
use rddl_engine::{ConfigError, Stepper};
use rddl_lang::{Domain, Instance, NonFluents, ParseError, SourceFile, Span};
use rddl_model::Model;

// ── LoadError ──────────────────────────────────────────────────────

/// Errors from [`load`] and [`load_instance`].
#[derive(Debug, PartialEq)]
pub enum LoadError {
    /// The source is not syntactically valid.
    Parse(ParseError),
    /// The source contains no `instance` block.
    NoInstance,
    /// Several instances exist and none was named.
    AmbiguousInstance {
        /// Every instance name, in source order.
        names: Vec<String>,
    },
    /// No instance has the requested name.
    UnknownInstance {
        /// The requested name.
        name: String,
    },
    /// The instance names a domain the source does not define.
    MissingDomain {
        /// The referenced domain.
        name: String,
    },
    /// The instance names a non-fluents block the source does not define.
    MissingNonFluents {
        /// The referenced block.
        name: String,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "parse: {e}"),
            Self::NoInstance => write!(f, "source contains no instance block"),
            Self::AmbiguousInstance { names } => {
                write!(f, "source contains {} instances: {}", names.len(), names.join(", "))
            }
            Self::UnknownInstance { name } => write!(f, "no instance named '{name}'"),
            Self::MissingDomain { name } => write!(f, "domain '{name}' is not defined"),
            Self::MissingNonFluents { name } => {
                write!(f, "non-fluents block '{name}' is not defined")
            }
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for LoadError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ── Problem ────────────────────────────────────────────────────────

/// One instance together with the domain and non-fluents it names.
#[derive(Clone, Debug, PartialEq)]
pub struct Problem {
    /// The instance's domain.
    pub domain: Domain,
    /// The instance's non-fluents. Empty, with an empty name, when the
    /// instance references none.
    pub non_fluents: NonFluents,
    /// The selected instance.
    pub instance: Instance,
}

impl Problem {
    /// Resolve, check and ground the problem.
    pub fn compile(&self) -> Result<Model, ValidationErrors> {
        Model::compile(&self.domain, &self.non_fluents, &self.instance)
    }

    /// Compile and start a stepper with default settings.
    pub fn stepper<R: RandomSource>(&self, rng: R) -> Result<Stepper<R>, ConfigError> {
        Stepper::new(&self.domain, &self.non_fluents, &self.instance, rng)
    }

    /// Split into `(domain, non_fluents, instance)`.
    pub fn into_parts(self) -> (Domain, NonFluents, Instance) {
        (self.domain, self.non_fluents, self.instance)
    }
}

/// Parse `source` and select its only instance.
pub fn load(source: &str) -> Result<Problem, LoadError> {
    let file = rddl_lang::parse(source)?;
    let instance = match file.instances.as_slice() {
        [] => return Err(LoadError::NoInstance),
        [one] => one.clone(),
        many => {
            return Err(LoadError::AmbiguousInstance {
                names: many.iter().map(|i| i.name.clone()).collect(),
            })
        }
    };
    assemble(file, instance)
}

/// Parse `source` and select the instance called `name`.
pub fn load_instance(source: &str, name: &str) -> Result<Problem, LoadError> {
    let file = rddl_lang::parse(source)?;
    let instance = file
        .instances
        .iter()
        .find(|i| i.name == name)
        .cloned()
        .ok_or_else(|| LoadError::UnknownInstance {
            name: name.to_string(),
        })?;
    assemble(file, instance)
}

fn assemble(file: SourceFile, instance: Instance) -> Result<Problem, LoadError> {
    let SourceFile {
        domains,
        non_fluents,
        ..
    } = file;
    let domain = domains
        .into_iter()
        .find(|d| d.name == instance.domain)
        .ok_or_else(|| LoadError::MissingDomain {
            name: instance.domain.clone(),
        })?;
    let non_fluents = match &instance.non_fluents {
        Some(name) => non_fluents
            .into_iter()
            .find(|nf| &nf.name == name)
            .ok_or_else(|| LoadError::MissingNonFluents { name: name.clone() })?,
        None => NonFluents {
            name: String::new(),
            domain: domain.name.clone(),
            objects: Vec::new(),
            values: Vec::new(),
            span: Span::default(),
        },
    };
    tracing::debug!(
        domain = %domain.name,
        non_fluents = %non_fluents.name,
        instance = %instance.name,
        "selected problem"
    );
    Ok(Problem {
        domain,
        non_fluents,
        instance,
    })
}
