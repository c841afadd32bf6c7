use hotframe_kernel::frame::TemplateParams;

/// Combine frame-local and global template parameters.
///
/// Globals are applied last and win on key collision.
pub fn merge_params(local: &TemplateParams, globals: &TemplateParams) -> TemplateParams {
    let mut merged = TemplateParams::with_capacity(local.len() + globals.len());
    merged.extend(local.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged.extend(globals.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}
