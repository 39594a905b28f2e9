use super::ModelSettings;

/// Environment variables checked for the model API key, in order
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "VITE_GEMINI_API_KEY"];
/// Environment variable overriding the model name
pub const MODEL_VAR: &str = "GEMINI_MODEL";
/// Environment variable overriding the endpoint base URL
pub const ENDPOINT_VAR: &str = "GEMINI_ENDPOINT";

/// Reads an environment variable, treating empty values as unset
pub fn get_env_value(key: &str) -> Option<String> {
    let value = std::env::var(key).ok()?;
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Applies environment overrides to the model settings
///
/// `lookup` is injected so callers (and tests) can supply a source other than
/// the process environment.
pub fn apply_overrides<F>(settings: &mut ModelSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = API_KEY_VARS.iter().find_map(|var| lookup(var)) {
        settings.api_key = Some(key);
    }
    if let Some(model) = lookup(MODEL_VAR) {
        settings.model = model;
    }
    if let Some(endpoint) = lookup(ENDPOINT_VAR) {
        settings.endpoint = endpoint;
    }
}
