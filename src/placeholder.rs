//! Deterministic placeholder files delivered when no real download succeeds.

use crate::catalog::Track;

/// Fixed 8-byte signature at the start of every placeholder file.
pub const PLACEHOLDER_SIGNATURE: [u8; 8] = *b"*FLACBOT";

/// Builds the placeholder byte sequence for a track.
///
/// Output is fully determined by the track fields: the fixed signature
/// followed by a UTF-8 text body naming the track and stating that the
/// content is a stand-in for real audio.
pub fn make_placeholder(track: &Track) -> Vec<u8> {
    let body = format!(
        "PLACEHOLDER AUDIO FILE\n\
         Title: {}\n\
         Artist: {}\n\
         Album: {}\n\
         \n\
         This is demonstration content generated locally because the real\n\
         download could not be obtained from the catalog API.\n",
        track.title, track.artist, track.album
    );

    let mut bytes = Vec::with_capacity(PLACEHOLDER_SIGNATURE.len() + body.len());
    bytes.extend_from_slice(&PLACEHOLDER_SIGNATURE);
    bytes.extend_from_slice(body.as_bytes());
    bytes
}

/// Makes a track-derived name safe for the local filesystem.
///
/// Replaces the characters `< > : " / \ | ? *` with `_`, collapses runs of
/// whitespace to a single space and trims the ends. Idempotent: applying it
/// twice yields the same result as once.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect();

    let mut out = String::with_capacity(replaced.len());
    let mut in_whitespace = false;
    for c in replaced.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push(' ');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }

    out.trim().to_string()
}
