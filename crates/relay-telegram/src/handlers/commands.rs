/// `/start`, optionally addressed as `/start@botname` and followed by a deep-link payload.
pub(crate) fn is_start(text: &str) -> bool {
    let Some(cmd) = text.split_whitespace().next() else {
        return false;
    };
    cmd == "/start" || cmd.starts_with("/start@")
}
