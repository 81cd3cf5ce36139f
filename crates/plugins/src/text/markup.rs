/// Decodes the escape forms used by scripted command arguments: `[n]` becomes
/// a line break and `_` becomes a space, since the host's command channel
/// cannot carry either literally.
pub fn decode_markup(raw: &str) -> String {
    raw.replace("[n]", "\n").replace('_', " ")
}
