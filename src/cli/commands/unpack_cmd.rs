//! unpack command - Unpack a packaged app into a directory tree

use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;
use crate::core::config;
use crate::ui::output;
use crate::unpack::{self, UnpackOptions};

/// Unpack `source` into `output`.
///
/// `output` defaults to the source file stem next to the source. The
/// `--clobber` default can be set in the global config; the flag always
/// wins when passed.
#[allow(clippy::too_many_arguments)]
pub fn unpack(
    ctx: &Context,
    source: &Path,
    output: Option<&Path>,
    clobber: bool,
    only_extract: bool,
    app_name: Option<String>,
    rename_old_postfix: Option<String>,
    rename_new_postfix: Option<String>,
) -> Result<()> {
    let config = config::load().context("Failed to load configuration")?;

    let source = resolve(ctx, source);
    if !source.is_file() {
        bail!("source '{}' does not exist", source.display());
    }
    let output = match output {
        Some(path) => resolve(ctx, path),
        None => default_output(&source)?,
    };
    output::debug(
        format!("unpacking {} into {}", source.display(), output.display()),
        ctx.verbosity,
    );

    let options = UnpackOptions {
        clobber: clobber || config.clobber_default(),
        only_extract,
        app_name,
        rename_old_postfix,
        rename_new_postfix,
    };

    unpack::unpack(&source, &output, &options, ctx.verbosity)
        .with_context(|| format!("Failed to unpack '{}'", source.display()))
}

/// Resolve a possibly relative path against `--cwd`.
fn resolve(ctx: &Context, path: &Path) -> PathBuf {
    match (&ctx.cwd, path.is_relative()) {
        (Some(cwd), true) => cwd.join(path),
        _ => path.to_path_buf(),
    }
}

/// The source file stem, next to the source.
fn default_output(source: &Path) -> Result<PathBuf> {
    let stem = source
        .file_stem()
        .with_context(|| format!("cannot derive an output name from '{}'", source.display()))?;
    Ok(source.with_file_name(stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::output::Verbosity;

    #[test]
    fn default_output_uses_source_stem() {
        assert_eq!(
            default_output(Path::new("/bundles/MyApp.zip")).unwrap(),
            PathBuf::from("/bundles/MyApp")
        );
    }

    #[test]
    fn resolve_honors_cwd_for_relative_paths() {
        let ctx = Context {
            cwd: Some(PathBuf::from("/work")),
            verbosity: Verbosity::Quiet,
        };
        assert_eq!(resolve(&ctx, Path::new("App.zip")), PathBuf::from("/work/App.zip"));
        assert_eq!(resolve(&ctx, Path::new("/abs/App.zip")), PathBuf::from("/abs/App.zip"));
    }
}
