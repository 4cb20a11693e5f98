// file: src/utils/validation.rs
// description: semantic validators for indicator candidates and startup inputs
// reference: input validation patterns

use crate::error::{PipelineError, Result};
use std::net::Ipv4Addr;
use std::path::Path;
use validator::ValidateEmail;

pub struct Validator;

impl Validator {
    /// RFC 5321/5322 mailbox check. Domains must carry at least one dot so
    /// intranet-style `user@host` forms are rejected.
    pub fn is_valid_email(candidate: &str) -> bool {
        let Some((_, domain)) = candidate.rsplit_once('@') else {
            return false;
        };

        if !domain.contains('.') {
            return false;
        }

        candidate.to_string().validate_email()
    }

    /// Strict dotted-quad parse; leading zeros and out-of-range octets fail.
    pub fn is_valid_ipv4(candidate: &str) -> bool {
        candidate.parse::<Ipv4Addr>().is_ok()
    }

    pub fn validate_directory(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(PipelineError::Config(format!(
                "Directory does not exist: {}",
                path.display()
            )));
        }

        if !path.is_dir() {
            return Err(PipelineError::Config(format!(
                "Path is not a directory: {}",
                path.display()
            )));
        }

        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PipelineError::Config(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }
}
