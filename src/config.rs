/// External configuration constants the runtime contract (§6) treats as
/// provided by the surrounding driver rather than hard-coded here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Initial value stored into scratch slot 0, the runtime stack pointer.
    /// The data stack grows downward from this index.
    pub max_scratch: u64,
    /// The number stamped into the emitted `#pragma version <n>` prefix.
    pub version_pragma: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_scratch: 256,
            version_pragma: 3,
        }
    }
}
