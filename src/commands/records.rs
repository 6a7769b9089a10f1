use serde_json::Value;

use crate::errors::Result;
use crate::models::GameInstallRecord;
use crate::LauncherContext;

pub fn install_info_insert(
    ctx: &LauncherContext,
    record: &GameInstallRecord,
) -> Result<GameInstallRecord> {
    ctx.installs.insert(record)
}

pub fn install_info_get_by_key(
    ctx: &LauncherContext,
    game_id: i64,
) -> Result<Option<GameInstallRecord>> {
    ctx.installs.get_by_key(game_id)
}

pub fn install_info_update(ctx: &LauncherContext, game_id: i64, patch: &Value) -> Result<usize> {
    ctx.installs.update(game_id, patch)
}

pub fn install_info_delete(ctx: &LauncherContext, game_id: i64) -> Result<usize> {
    ctx.installs.delete(game_id)
}

pub fn settings_get(ctx: &LauncherContext) -> Result<Option<Value>> {
    ctx.settings.get()
}

pub fn settings_update(ctx: &LauncherContext, patch: &Value) -> Result<usize> {
    ctx.settings.update(patch)
}
