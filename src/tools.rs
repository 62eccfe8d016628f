//! Flash tool backend registration and dispatch

use pnor_core::config::Config;
use pnor_core::mediator::{AccessMediator, HiomapdMediator};
use pnor_core::tool::{FlashTool, PflashTool};
use std::collections::HashMap;

/// Information about a backend
pub struct ToolInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Short description
    pub description: &'static str,
}

/// All backends enabled at compile time
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_tools() -> Vec<ToolInfo> {
    let mut tools = Vec::new();

    tools.push(ToolInfo {
        name: "pflash",
        description: "External pflash binary, access mediated through hiomapd",
    });

    #[cfg(feature = "dummy")]
    tools.push(ToolInfo {
        name: "dummy",
        description: "In-memory PNOR emulator (image=<VERSION partition file>)",
    });

    tools
}

/// Parsed backend parameters
pub struct ToolParams {
    /// Backend name
    pub name: String,
    /// Key-value parameters
    pub params: HashMap<String, String>,
}

/// Parse a backend string into name and parameters
///
/// Format: `name` or `name:key=value,key=value`. The name must not be
/// empty, every option needs a non-empty key, and a key may appear once.
pub fn parse_tool_params(s: &str) -> Result<ToolParams, Box<dyn std::error::Error>> {
    let (name, options) = match s.split_once(':') {
        Some((name, options)) => (name.trim(), Some(options)),
        None => (s.trim(), None),
    };
    if name.is_empty() {
        return Err(format!("Missing tool name in '{}'", s).into());
    }

    let mut params = HashMap::new();
    for opt in options.into_iter().flat_map(|o| o.split(',')) {
        let (key, value) = opt
            .split_once('=')
            .ok_or_else(|| format!("Invalid tool option '{}' (expected key=value)", opt))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("Empty option name in '{}'", opt).into());
        }
        if params.insert(key.to_string(), value.to_string()).is_some() {
            return Err(format!("Tool option '{}' given more than once", key).into());
        }
    }

    Ok(ToolParams {
        name: name.to_string(),
        params,
    })
}

/// A flash tool together with the mediator guarding it
pub struct Backend {
    /// Flash tool
    pub tool: Box<dyn FlashTool>,
    /// Access mediator
    pub mediator: Box<dyn AccessMediator>,
}

/// Open the backend described by `tool` (`name` or `name:key=value,...`)
pub fn open_backend(tool: &str, config: &Config) -> Result<Backend, Box<dyn std::error::Error>> {
    let params = parse_tool_params(tool)?;

    match params.name.as_str() {
        "pflash" => {
            if !params.params.is_empty() {
                return Err("pflash takes no parameters, use the [tool] config section".into());
            }
            let tool = PflashTool::from_config(&config.tool);
            log::debug!(
                "Using {} (timeout {:?})",
                config.tool.path.display(),
                tool.timeout()
            );
            Ok(Backend {
                tool: Box::new(tool),
                mediator: Box::new(HiomapdMediator::new(config.mediator.clone())),
            })
        }

        #[cfg(feature = "dummy")]
        "dummy" => open_dummy(&params, config),

        _ => Err(format!("Unknown tool: {}", params.name).into()),
    }
}

#[cfg(feature = "dummy")]
fn open_dummy(
    params: &ToolParams,
    config: &Config,
) -> Result<Backend, Box<dyn std::error::Error>> {
    use pnor_dummy::{DummyPnor, RecordingMediator};

    let pnor = DummyPnor::standard();
    for (key, value) in &params.params {
        match key.as_str() {
            "image" => {
                let data = std::fs::read(value)
                    .map_err(|e| format!("Failed to read image {}: {}", value, e))?;
                pnor.set_data(&config.partitions.version, &data);
                log::info!("Loaded {} bytes into {}", data.len(), config.partitions.version);
            }
            _ => return Err(format!("Unknown dummy parameter: {}", key).into()),
        }
    }

    let mediator = RecordingMediator::new(pnor.journal().clone());
    Ok(Backend {
        tool: Box::new(pnor),
        mediator: Box::new(mediator),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_name() {
        let params = parse_tool_params("pflash").unwrap();
        assert_eq!(params.name, "pflash");
        assert!(params.params.is_empty());
    }

    #[test]
    fn test_parse_with_params() {
        let params = parse_tool_params("dummy:image=/tmp/version.bin").unwrap();
        assert_eq!(params.name, "dummy");
        assert_eq!(
            params.params.get("image").map(String::as_str),
            Some("/tmp/version.bin")
        );
    }

    #[test]
    fn test_parse_rejects_bare_option() {
        assert!(parse_tool_params("dummy:image").is_err());
    }

    #[test]
    fn test_parse_rejects_duplicate_key() {
        let err = parse_tool_params("dummy:image=a.bin,image=b.bin")
            .err()
            .unwrap();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_parse_rejects_empty_parts() {
        assert!(parse_tool_params("").is_err());
        assert!(parse_tool_params(":image=a.bin").is_err());
        assert!(parse_tool_params("dummy:=a.bin").is_err());
        // Trailing colon means an empty option, not "no options"
        assert!(parse_tool_params("dummy:").is_err());
    }

    #[test]
    fn test_unknown_tool() {
        assert!(open_backend("ch341a", &Config::default()).is_err());
        assert!(open_backend("pflash:dev=0", &Config::default()).is_err());
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_open_dummy_with_image() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"open-power-v1\n\tskiboot-v1\0").unwrap();

        let tool = format!("dummy:image={}", file.path().display());
        let backend = open_backend(&tool, &Config::default()).unwrap();
        let pnor = pnor_core::tool::Pnor::new(&*backend.tool);
        assert_eq!(
            pnor_core::version::extract_version(&pnor, "VERSION"),
            "open-power-v1\n\tskiboot-v1"
        );
    }
}
