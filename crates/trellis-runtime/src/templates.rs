//! Template selection.
//!
//! The engine does not render anything itself. It picks the template and
//! layout files by convention from the presenter name and view, then hands
//! them to a [`TemplateRenderer`].
//!
//! # Lookup
//!
//! Module segments of the presenter name map to `<Module>Module/`
//! directories (`Admin:Shop:Products` → `AdminModule/ShopModule/Products`):
//!
//! ```text
//! content (view "show")            layout ("layout")
//! ─────────────────────────        ─────────────────────────────────
//! <dir>/<P>/show.<ext>             <dir>/<P>/@layout.<ext>
//! <dir>/<P>.show.<ext>             <dir>/<P>.@layout.<ext>
//! <dir>/@global.show.<ext>         <dir>/<Module>/@layout.<ext>
//!                                  <dir>/@layout.<ext>
//! ```
//!
//! The first existing file wins. A missing content template fails the
//! request; a missing layout just renders without one.

use crate::config::TemplatesConfig;
use crate::DispatchError;
use std::path::{Path, PathBuf};
use trellis_types::Params;

/// Renders a selected template.
pub trait TemplateRenderer: Send + Sync {
    /// Returns `true` if `path` names a template file.
    fn template_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// Renders `template` inside `layout` with the presenter's parameters.
    ///
    /// # Errors
    ///
    /// A message describing the rendering failure.
    fn render(&self, template: &Path, layout: Option<&Path>, params: &Params) -> Result<(), String>;
}

/// Files chosen for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSelection {
    pub template: PathBuf,
    pub layout: Option<PathBuf>,
}

/// Directory form of a presenter name (`Shop:Products` → `ShopModule/Products`).
#[must_use]
pub fn presenter_path(presenter: &str) -> String {
    presenter.replace(':', "Module/")
}

/// Candidate content templates for `view`, in lookup order.
#[must_use]
pub fn format_template_files(dir: &Path, presenter: &str, view: &str, ext: &str) -> Vec<PathBuf> {
    let presenter = presenter_path(presenter);
    vec![
        dir.join(&presenter).join(format!("{view}.{ext}")),
        dir.join(format!("{presenter}.{view}.{ext}")),
        dir.join(format!("@global.{view}.{ext}")),
    ]
}

/// Candidate layout templates for `layout`, in lookup order.
#[must_use]
pub fn format_layout_files(dir: &Path, presenter: &str, layout: &str, ext: &str) -> Vec<PathBuf> {
    let presenter = presenter_path(presenter);
    let file = format!("@{layout}.{ext}");
    let mut files = vec![
        dir.join(&presenter).join(&file),
        dir.join(format!("{presenter}.{file}")),
    ];
    if let Some((module, _)) = presenter.rsplit_once('/') {
        files.push(dir.join(module).join(&file));
    }
    files.push(dir.join(&file));
    files
}

/// Picks the content template and layout for a presenter view.
///
/// `layout` of `None` disables the layout.
///
/// # Errors
///
/// [`DispatchError::BadRequest`] if no content template exists.
pub fn select_template(
    renderer: &dyn TemplateRenderer,
    config: &TemplatesConfig,
    presenter: &str,
    view: &str,
    layout: Option<&str>,
) -> Result<TemplateSelection, DispatchError> {
    let files = format_template_files(&config.dir, presenter, view, &config.extension);
    let template = files
        .iter()
        .find(|f| renderer.template_exists(f))
        .cloned()
        .ok_or_else(|| {
            let first = files.first().map(|f| f.display().to_string()).unwrap_or_default();
            DispatchError::BadRequest(format!("Page not found. Missing template '{first}'."))
        })?;

    let layout = layout.filter(|l| !l.is_empty()).and_then(|layout| {
        format_layout_files(&config.dir, presenter, layout, &config.extension)
            .into_iter()
            .find(|f| renderer.template_exists(f))
    });

    tracing::debug!(
        template = %template.display(),
        layout = ?layout.as_ref().map(|l| l.display().to_string()),
        "template selected"
    );
    Ok(TemplateSelection { template, layout })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Files(HashSet<PathBuf>);

    impl TemplateRenderer for Files {
        fn template_exists(&self, path: &Path) -> bool {
            self.0.contains(path)
        }

        fn render(&self, _: &Path, _: Option<&Path>, _: &Params) -> Result<(), String> {
            Ok(())
        }
    }

    fn files(paths: &[&str]) -> Files {
        Files(paths.iter().map(PathBuf::from).collect())
    }

    #[test]
    fn template_candidates() {
        let files = format_template_files(Path::new("t"), "Shop:Products", "show", "phtml");
        assert_eq!(
            files,
            vec![
                PathBuf::from("t/ShopModule/Products/show.phtml"),
                PathBuf::from("t/ShopModule/Products.show.phtml"),
                PathBuf::from("t/@global.show.phtml"),
            ]
        );
    }

    #[test]
    fn layout_candidates_include_module_only_when_nested() {
        let nested = format_layout_files(Path::new("t"), "Shop:Products", "layout", "phtml");
        assert_eq!(nested.len(), 4);
        assert_eq!(nested[2], PathBuf::from("t/ShopModule/@layout.phtml"));

        let flat = format_layout_files(Path::new("t"), "Homepage", "layout", "phtml");
        assert_eq!(
            flat,
            vec![
                PathBuf::from("t/Homepage/@layout.phtml"),
                PathBuf::from("t/Homepage.@layout.phtml"),
                PathBuf::from("t/@layout.phtml"),
            ]
        );
    }

    #[test]
    fn select_first_existing_files() {
        let renderer = files(&["templates/Homepage.default.phtml", "templates/@layout.phtml"]);
        let selection = select_template(
            &renderer,
            &TemplatesConfig::default(),
            "Homepage",
            "default",
            Some("layout"),
        )
        .expect("template exists");

        assert_eq!(selection.template, PathBuf::from("templates/Homepage.default.phtml"));
        assert_eq!(selection.layout, Some(PathBuf::from("templates/@layout.phtml")));
    }

    #[test]
    fn disabled_or_missing_layout_is_none() {
        let renderer = files(&["templates/Homepage/default.phtml"]);
        let config = TemplatesConfig::default();

        let selection =
            select_template(&renderer, &config, "Homepage", "default", Some("layout")).expect("ok");
        assert_eq!(selection.layout, None);

        let selection = select_template(&renderer, &config, "Homepage", "default", None).expect("ok");
        assert_eq!(selection.layout, None);
    }

    #[test]
    fn missing_template_is_bad_request() {
        let err = select_template(
            &files(&[]),
            &TemplatesConfig::default(),
            "Homepage",
            "default",
            Some("layout"),
        )
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Page not found. Missing template 'templates/Homepage/default.phtml'."
        );
        assert_eq!(err.http_status(), 404);
    }
}
