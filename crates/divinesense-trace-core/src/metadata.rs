//! Process-static metadata (hostname, runtime identifier, CPU count),
//! computed once and published lock-free through a `OnceLock`.

use std::sync::OnceLock;

/// Process-wide metadata attached to every sampled trace and to the Jaeger
/// exporter's process block.
#[derive(Debug, Clone)]
pub struct StaticMetadata {
    pub hostname: String,
    pub runtime_version: String,
    pub cpu_count: usize,
}

static STATIC_METADATA: OnceLock<StaticMetadata> = OnceLock::new();

/// Returns the process-static metadata, computing it on first call.
pub fn static_metadata() -> &'static StaticMetadata {
    STATIC_METADATA.get_or_init(|| StaticMetadata {
        hostname: resolve_hostname(),
        runtime_version: concat!("divinesense-trace/", env!("CARGO_PKG_VERSION")).to_string(),
        cpu_count: std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
    })
}

fn resolve_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|s| s.into_string().ok())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_metadata_is_memoized() {
        let a = static_metadata();
        let b = static_metadata();
        assert_eq!(a.hostname, b.hostname);
        assert!(a.cpu_count >= 1);
    }
}
