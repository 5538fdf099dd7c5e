use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use super::hls::Rendition;

/// Writes the top-level ABR manifest. Variants are emitted in the order
/// given (planner order, ascending bandwidth); each entry's playlist path is
/// relative to the master's own directory with `/` separators on every OS.
pub fn write_master(master: &Path, variants: &[(Rendition, PathBuf)]) -> io::Result<()> {
    let base = master.parent().unwrap_or_else(|| Path::new(""));
    let mut out = String::from("#EXTM3U\n");
    for (rendition, playlist) in variants {
        let rel = relative_to(playlist, base);
        out.push_str(&format!(
            "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={},NAME=\"{}\"\n{}\n",
            rendition.bandwidth(),
            rendition.resolution(),
            rendition.name,
            rel
        ));
    }
    fs::write(master, out)
}

fn relative_to(path: &Path, base: &Path) -> String {
    let stripped = path.strip_prefix(base).unwrap_or(path);
    stripped
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
