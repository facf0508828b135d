#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    OutsideInputPrefix,
    EmptyFilename,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OutsideInputPrefix => "outside_input_prefix",
            Self::EmptyFilename => "empty_filename",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRoute {
    Process {
        filename: String,
        output_key: String,
    },
    Skip(SkipReason),
}

/// Decodes an object key as carried in storage notifications: `+` stands for
/// a space and everything else is percent-encoded.
pub fn decode_object_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Maps a decoded key under `input_prefix` to the same relative filename
/// under `output_prefix`.
pub fn route_object_key(key: &str, input_prefix: &str, output_prefix: &str) -> KeyRoute {
    let Some(filename) = key.strip_prefix(input_prefix) else {
        return KeyRoute::Skip(SkipReason::OutsideInputPrefix);
    };

    if filename.is_empty() {
        return KeyRoute::Skip(SkipReason::EmptyFilename);
    }

    KeyRoute::Process {
        filename: filename.to_string(),
        output_key: format!("{output_prefix}{filename}"),
    }
}
