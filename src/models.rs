use serde::{Deserialize, Serialize};

/// Lifecycle of one game installation, persisted in the install record so the
/// UI can resume rendering the correct state after a restart.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallState {
    NotInstalled,
    Downloading,
    Extracting,
    Installed,
    InstallError,
}

/// One record per game in the install store, keyed by `game_id`.
///
/// `installed_version` is an opaque version token; it is kept as a string so
/// semantic versions survive unchanged.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameInstallRecord {
    pub game_id: i64,
    pub install_path: String,
    pub installed_version: String,
    pub install_state: InstallState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_record_serializes_with_camel_case_keys() {
        let record = GameInstallRecord {
            game_id: 42,
            install_path: "/games/42".to_string(),
            installed_version: "1.2.0".to_string(),
            install_state: InstallState::Downloading,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["gameId"], 42);
        assert_eq!(value["installPath"], "/games/42");
        assert_eq!(value["installedVersion"], "1.2.0");
        assert_eq!(value["installState"], "Downloading");

        let back: GameInstallRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
