use anyhow::Context;
use youtudown_core::models::settings::AppSettings;

use crate::cli::SettingsAction;
use crate::storage::config;
use crate::AppContext;

pub fn handle(ctx: &AppContext, action: SettingsAction) -> anyhow::Result<()> {
    let settings = match action {
        SettingsAction::Show => ctx.settings.clone(),
        SettingsAction::Set { patch } => update_settings(ctx, &patch)?,
        SettingsAction::Reset => reset_settings(ctx)?,
    };
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

pub fn update_settings(ctx: &AppContext, partial: &str) -> anyhow::Result<AppSettings> {
    let updated = apply_patch(&ctx.settings, partial)?;
    config::save_settings(ctx.paths.as_ref(), &updated)?;
    tracing::info!("settings saved to {}", config::settings_path(ctx.paths.as_ref()).display());
    Ok(updated)
}

pub fn reset_settings(ctx: &AppContext) -> anyhow::Result<AppSettings> {
    let defaults = AppSettings::default();
    config::save_settings(ctx.paths.as_ref(), &defaults)?;
    Ok(defaults)
}

pub fn apply_patch(current: &AppSettings, partial: &str) -> anyhow::Result<AppSettings> {
    let patch: serde_json::Value = serde_json::from_str(partial).context("invalid JSON")?;
    let mut current_val = serde_json::to_value(current)?;
    merge_json(&mut current_val, &patch);
    serde_json::from_value(current_val).context("patch does not fit the settings")
}

fn merge_json(base: &mut serde_json::Value, patch: &serde_json::Value) {
    if let (Some(base_obj), Some(patch_obj)) = (base.as_object_mut(), patch.as_object()) {
        for (key, value) in patch_obj {
            match base_obj.get_mut(key) {
                Some(existing) if value.is_object() && existing.is_object() => {
                    merge_json(existing, value)
                }
                _ => {
                    base_obj.insert(key.clone(), value.clone());
                }
            }
        }
    }
}
