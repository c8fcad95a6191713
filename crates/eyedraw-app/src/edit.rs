//! Command line argument forms.

use eyedraw_core::{DoodleClass, DrawingId, UnknownClass};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    #[error("expected DRAWING:CLASS:PARAM=VALUE, got '{0}'")]
    Edit(String),
    #[error("expected DRAWING=FILE, got '{0}'")]
    Load(String),
    #[error(transparent)]
    Class(#[from] UnknownClass),
}

/// A parameter edit: `DRAWING:CLASS:PARAM=VALUE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub drawing: DrawingId,
    pub class: DoodleClass,
    pub parameter: String,
    pub value: String,
}

impl FromStr for Edit {
    type Err = ArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ArgError::Edit(s.to_string());
        let (target, value) = s.split_once('=').ok_or_else(malformed)?;
        let mut parts = target.splitn(3, ':');
        let (Some(drawing), Some(class), Some(parameter)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed());
        };
        if drawing.is_empty() || parameter.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            drawing: drawing.into(),
            class: class.parse()?,
            parameter: parameter.to_string(),
            value: value.to_string(),
        })
    }
}

/// A saved drawing to load: `DRAWING=FILE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Load {
    pub drawing: DrawingId,
    pub path: PathBuf,
}

impl FromStr for Load {
    type Err = ArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((drawing, path)) if !drawing.is_empty() && !path.is_empty() => Ok(Self {
                drawing: drawing.into(),
                path: PathBuf::from(path),
            }),
            _ => Err(ArgError::Load(s.to_string())),
        }
    }
}
