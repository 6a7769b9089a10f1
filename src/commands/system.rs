use crate::errors::Result;
use crate::LauncherContext;

pub fn run_command(ctx: &LauncherContext, command: &str) -> Result<String> {
    ctx.processes.run(command)
}

/// Platform name in the form the renderer historically consumed
/// (`darwin` / `win32` / `linux`).
pub fn get_platform() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

/// Locale from the environment (`LC_ALL`, then `LANG`), stripped of its
/// encoding suffix, with an `en` fallback.
pub fn get_locale() -> String {
    for var in ["LC_ALL", "LANG"] {
        if let Ok(value) = std::env::var(var) {
            let trimmed = value.trim();
            if !trimmed.is_empty() && trimmed != "C" && trimmed != "POSIX" {
                let locale = trimmed.split('.').next().unwrap_or(trimmed);
                return locale.replace('_', "-");
            }
        }
    }
    "en".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_name_uses_renderer_conventions() {
        let platform = get_platform();
        assert!(["darwin", "win32", "linux"].contains(&platform) || !platform.is_empty());
    }

    #[test]
    fn locale_is_never_empty() {
        assert!(!get_locale().is_empty());
    }
}
