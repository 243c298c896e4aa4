use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// Quantization methods supported by llama.cpp.
///
/// The set is closed: tags found in artifact file names are only ever
/// interpreted against this list, never against anything hub-reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantMethod {
    Q2K,
    Q3KS,
    Q3KM,
    Q3KL,
    Q4_0,
    Q4KS,
    Q4KM,
    Q5_0,
    Q5KS,
    Q5KM,
    Q6K,
    Q8_0,
}

pub const ALL_METHODS: &[QuantMethod] = &[
    QuantMethod::Q2K,
    QuantMethod::Q3KS,
    QuantMethod::Q3KM,
    QuantMethod::Q3KL,
    QuantMethod::Q4_0,
    QuantMethod::Q4KS,
    QuantMethod::Q4KM,
    QuantMethod::Q5_0,
    QuantMethod::Q5KS,
    QuantMethod::Q5KM,
    QuantMethod::Q6K,
    QuantMethod::Q8_0,
];

impl QuantMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuantMethod::Q2K => "Q2_K",
            QuantMethod::Q3KS => "Q3_K_S",
            QuantMethod::Q3KM => "Q3_K_M",
            QuantMethod::Q3KL => "Q3_K_L",
            QuantMethod::Q4_0 => "Q4_0",
            QuantMethod::Q4KS => "Q4_K_S",
            QuantMethod::Q4KM => "Q4_K_M",
            QuantMethod::Q5_0 => "Q5_0",
            QuantMethod::Q5KS => "Q5_K_S",
            QuantMethod::Q5KM => "Q5_K_M",
            QuantMethod::Q6K => "Q6_K",
            QuantMethod::Q8_0 => "Q8_0",
        }
    }

    /// Extract the quantization tag from an artifact path.
    ///
    /// Hub naming conventionally puts the tag in the second dot-delimited
    /// segment of the file name (e.g., "llama-2-7b.Q4_K_M.gguf"), but that
    /// is convention, not contract. Every segment of the file name is
    /// checked against the closed set and the first exact match wins.
    pub fn from_artifact_path(path: &str) -> Option<QuantMethod> {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        file_name
            .split('.')
            .find_map(|segment| QuantMethod::from_str(segment).ok())
    }
}

impl fmt::Display for QuantMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuantMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_METHODS
            .iter()
            .copied()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| {
                let supported: Vec<&str> = ALL_METHODS.iter().map(|m| m.as_str()).collect();
                Error::InvalidArgument(format!(
                    "unknown quantization method '{}' (supported: {})",
                    s,
                    supported.join(", ")
                ))
            })
    }
}
