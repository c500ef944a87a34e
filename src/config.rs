//! Configuration types for the converter.
//!
//! All conversion behaviour is controlled through [`ConverterConfig`], built
//! via its [`ConverterConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share a config across call sites and to log the settings a
//! run actually used.
//!
//! # Design choice: builder over constructor
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest.

use crate::engine::ConversionEngine;
use crate::error::PdfmdError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for a [`crate::convert::Converter`].
///
/// Built via [`ConverterConfig::builder()`] or using
/// [`ConverterConfig::default()`].
///
/// # Example
/// ```rust
/// use pdfmd::{ConverterConfig, DeviceMode};
///
/// let config = ConverterConfig::builder()
///     .device(DeviceMode::Cpu)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone, Default)]
pub struct ConverterConfig {
    /// Execution device requested for the engine. Default: [`DeviceMode::Auto`].
    ///
    /// `Auto` probes for hardware acceleration when the engine is first
    /// constructed. The probe is best-effort: when no accelerator is found
    /// the engine falls back to CPU mode with an info-level log line, never
    /// an error.
    pub device: DeviceMode,

    /// User password for encrypted PDFs. Default: none.
    pub password: Option<String>,

    /// Extension given to output files, without the leading dot. Default: "md".
    pub markdown_extension: Option<String>,

    /// Pre-constructed engine. When set, lazy initialization installs this
    /// engine instead of running the default factory. Useful in tests or
    /// when the caller shares one engine across several converters.
    pub engine: Option<Arc<dyn ConversionEngine>>,

    /// Per-file progress events for batch runs. Default: none (noop).
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for ConverterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterConfig")
            .field("device", &self.device)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("markdown_extension", &self.markdown_extension)
            .field("engine", &self.engine.as_ref().map(|_| "<dyn ConversionEngine>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConvertProgressCallback>"),
            )
            .finish()
    }
}

impl ConverterConfig {
    /// Create a new builder for `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder {
            config: Self::default(),
        }
    }

    /// The output-file extension, without the leading dot.
    pub fn markdown_extension(&self) -> &str {
        self.markdown_extension.as_deref().unwrap_or("md")
    }
}

/// Builder for [`ConverterConfig`].
#[derive(Debug)]
pub struct ConverterConfigBuilder {
    config: ConverterConfig,
}

impl ConverterConfigBuilder {
    pub fn device(mut self, device: DeviceMode) -> Self {
        self.config.device = device;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn markdown_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.markdown_extension = Some(ext.into());
        self
    }

    pub fn engine(mut self, engine: Arc<dyn ConversionEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConverterConfig, PdfmdError> {
        if let Some(ref ext) = self.config.markdown_extension {
            if ext.is_empty() {
                return Err(PdfmdError::InvalidConfig(
                    "markdown_extension must not be empty".into(),
                ));
            }
            if ext.starts_with('.') {
                return Err(PdfmdError::InvalidConfig(format!(
                    "markdown_extension must not include the dot, got '{ext}'"
                )));
            }
        }
        Ok(self.config)
    }
}

/// Execution device requested for the conversion engine.
///
/// `Auto` resolves at engine-construction time via a best-effort probe.
/// The probe honours a `PDFMD_DEVICE` environment override (`accelerated`
/// or `cpu`) and otherwise reports no accelerator, so the default engine
/// runs on CPU. A failed or empty probe never fails construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceMode {
    /// Probe for an accelerator on first use (default).
    #[default]
    Auto,
    /// Force hardware acceleration. Engines without accelerator support
    /// log and ignore this.
    Accelerated,
    /// Force CPU execution.
    Cpu,
}

impl DeviceMode {
    /// Resolve `Auto` into a concrete mode.
    ///
    /// Called once, during engine construction. Explicit modes pass
    /// through unchanged.
    pub fn resolve(self) -> DeviceMode {
        match self {
            DeviceMode::Auto => match probe_accelerator() {
                Some(hint) => {
                    tracing::info!("Using hardware acceleration: {hint}");
                    DeviceMode::Accelerated
                }
                None => {
                    tracing::info!("No accelerator detected, using CPU");
                    DeviceMode::Cpu
                }
            },
            other => other,
        }
    }
}

impl fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceMode::Auto => write!(f, "auto"),
            DeviceMode::Accelerated => write!(f, "accelerated"),
            DeviceMode::Cpu => write!(f, "cpu"),
        }
    }
}

/// Best-effort accelerator probe.
///
/// Honours the `PDFMD_DEVICE` environment variable so deployments can pin
/// a device without code changes. Returns `None` when nothing usable is
/// found; the caller falls back to CPU.
fn probe_accelerator() -> Option<String> {
    match std::env::var("PDFMD_DEVICE") {
        Ok(v) if v.eq_ignore_ascii_case("accelerated") => Some("PDFMD_DEVICE override".into()),
        Ok(v) if v.eq_ignore_ascii_case("cpu") => None,
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_extension_is_md() {
        let config = ConverterConfig::default();
        assert_eq!(config.markdown_extension(), "md");
    }

    #[test]
    fn builder_accepts_custom_extension() {
        let config = ConverterConfig::builder()
            .markdown_extension("markdown")
            .build()
            .unwrap();
        assert_eq!(config.markdown_extension(), "markdown");
    }

    #[test]
    fn builder_rejects_empty_extension() {
        let result = ConverterConfig::builder().markdown_extension("").build();
        assert!(matches!(result, Err(PdfmdError::InvalidConfig(_))));
    }

    #[test]
    fn builder_rejects_leading_dot() {
        let result = ConverterConfig::builder().markdown_extension(".md").build();
        assert!(matches!(result, Err(PdfmdError::InvalidConfig(_))));
    }

    #[test]
    fn explicit_device_modes_resolve_to_themselves() {
        assert_eq!(DeviceMode::Cpu.resolve(), DeviceMode::Cpu);
        assert_eq!(DeviceMode::Accelerated.resolve(), DeviceMode::Accelerated);
    }

    #[test]
    fn debug_redacts_password() {
        let config = ConverterConfig::builder().password("secret").build().unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("redacted"));
    }
}
