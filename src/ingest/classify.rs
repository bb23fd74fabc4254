//! Input file classification.
//!
//! Monthly inputs arrive as a bundle of spreadsheets whose names drift from
//! month to month ("ADMISSÃO ABRIL.xlsx", "admissao maio.csv"). Each file is
//! assigned a [`Role`] by keyword search in its name.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::SourcesConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::Role;

use super::normalize::strip_accents;

/// Returns true for archive entries that are operating-system metadata.
fn is_system_entry(path: &str) -> bool {
    path.starts_with("__MACOSX/") || path.contains(".DS_Store") || path.ends_with('/')
}

/// Lowercases and strips accents so keywords match regardless of spelling.
fn fold(text: &str) -> String {
    strip_accents(text).to_lowercase()
}

/// Returns the role a file name belongs to, if any.
///
/// An exact match on a role's configured `file` wins; otherwise roles are
/// tried in [`Role::ALL`] order and the first whose keyword appears in the
/// folded file name is returned.
pub fn classify_filename(path: &str, sources: &SourcesConfig) -> Option<Role> {
    if is_system_entry(path) {
        return None;
    }

    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let folded = fold(file_name);

    let exact = Role::ALL.into_iter().find(|role| {
        sources
            .sources
            .get(role)
            .and_then(|s| s.file.as_deref())
            .is_some_and(|f| fold(f) == folded)
    });
    if exact.is_some() {
        return exact;
    }

    Role::ALL.into_iter().find(|role| {
        sources.sources.get(role).is_some_and(|source| {
            source
                .keywords
                .iter()
                .any(|keyword| folded.contains(&fold(keyword)))
        })
    })
}

/// Classifies a list of file names into roles.
///
/// The first file found for a role wins; later candidates are logged and
/// ignored. Fails with [`EngineError::UnresolvedRoles`] when a required role
/// has no file.
///
/// # Example
///
/// ```no_run
/// use vr_engine::config::ConfigLoader;
/// use vr_engine::ingest::classify_files;
/// use vr_engine::models::Role;
///
/// let loader = ConfigLoader::load("./config/default")?;
/// let names = ["bundle/ATIVOS.csv", "bundle/FÉRIAS.csv"];
/// let roles = classify_files(names, loader.config().sources())?;
/// assert_eq!(roles[&Role::Vacations], "bundle/FÉRIAS.csv");
/// # Ok::<(), vr_engine::error::EngineError>(())
/// ```
pub fn classify_files<'a, I>(names: I, sources: &SourcesConfig) -> EngineResult<BTreeMap<Role, String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut resolved: BTreeMap<Role, String> = BTreeMap::new();

    for name in names {
        match classify_filename(name, sources) {
            Some(role) => {
                if let Some(existing) = resolved.get(&role) {
                    warn!(
                        role = %role,
                        kept = %existing,
                        ignored = %name,
                        "Several files match the same role"
                    );
                } else {
                    debug!(role = %role, file = %name, "Classified input file");
                    resolved.insert(role, name.to_string());
                }
            }
            None => debug!(file = %name, "File does not match any role"),
        }
    }

    let missing: Vec<String> = Role::ALL
        .into_iter()
        .filter(|role| role.is_required() && !resolved.contains_key(role))
        .map(|role| role.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(EngineError::UnresolvedRoles { roles: missing });
    }

    Ok(resolved)
}
