use crate::error::GeneratorError;

/// Java package that holds `Api`, `Observer` and `MethodHandler`.
pub const DEFAULT_RUNTIME_PACKAGE: &str = "org.yamcs.api";

///
/// Settings for one generation run.
///
/// The plugin reads these from the protoc `parameter` string, e.g.
/// `--java-dispatch_opt=runtime_package=com.example.rpc,generated_annotation=false`.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Package of the runtime collaborators the generated classes are written against.
    pub runtime_package: String,
    /// Whether to stamp `@javax.annotation.processing.Generated` on every class.
    pub generated_annotation: bool,
    /// Date stamped into the generated annotation.
    pub timestamp: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            runtime_package: DEFAULT_RUNTIME_PACKAGE.to_string(),
            generated_annotation: true,
            timestamp: now(),
        }
    }
}

impl GeneratorConfig {
    ///
    /// Parses the comma separated `key=value` list protoc forwards to the plugin.
    ///
    /// Blank entries are skipped. Unknown keys are rejected rather than ignored so
    /// that a typo in the build script does not silently change the output.
    ///
    pub fn from_parameter(parameter: &str) -> Result<Self, GeneratorError> {
        let mut config = Self::default();

        for entry in parameter.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (key, value) = entry.split_once('=').ok_or_else(|| {
                GeneratorError::InvalidParameter(format!("expected `key=value`, found `{entry}`"))
            })?;
            let value = value.trim();

            match key.trim() {
                "runtime_package" => {
                    if value.is_empty() {
                        return Err(GeneratorError::InvalidParameter(
                            "`runtime_package` must not be empty".to_string(),
                        ));
                    }
                    config.runtime_package = value.to_string();
                }
                "generated_annotation" => {
                    config.generated_annotation = value.parse().map_err(|_| {
                        GeneratorError::InvalidParameter(format!(
                            "`generated_annotation` expects `true` or `false`, found `{value}`"
                        ))
                    })?;
                }
                "timestamp" => config.timestamp = value.to_string(),
                other => {
                    return Err(GeneratorError::InvalidParameter(format!(
                        "unknown option `{other}`"
                    )))
                }
            }
        }

        Ok(config)
    }

    /// Pins the generation date, for reproducible output.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
