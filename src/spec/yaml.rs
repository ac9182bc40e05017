//! Minimal YAML document model and emitter.
//!
//! Mappings are ordered (`Vec` of entries, not a map type) so emitted
//! documents are deterministic, and comment lines can be interleaved between
//! entries, which no serialization crate offers.

/// A YAML value — the subset the spec generator needs.
#[derive(Debug, Clone, PartialEq)]
pub enum YamlValue {
    /// A scalar rendered verbatim. Use [`YamlValue::string`] for quoting.
    Scalar(String),
    /// An ordered mapping of keys to values, with optional comment entries.
    Mapping(Vec<YamlEntry>),
    /// A sequence (list) of values.
    Sequence(Vec<YamlValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum YamlEntry {
    Pair(String, YamlValue),
    Comment(String),
}

impl YamlValue {
    /// A double-quoted string scalar with escaping.
    pub fn string(value: &str) -> Self {
        let escaped = value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n");
        YamlValue::Scalar(format!("\"{escaped}\""))
    }

    /// An unquoted scalar (numbers, booleans, null, pre-formatted text).
    pub fn raw(value: impl Into<String>) -> Self {
        YamlValue::Scalar(value.into())
    }

    pub fn pair(key: &str, value: YamlValue) -> YamlEntry {
        YamlEntry::Pair(key.to_string(), value)
    }
}

/// Emits a [`YamlValue`] tree as YAML text, two-space indentation.
pub struct YamlEmitter {
    output: String,
}

impl YamlEmitter {
    pub fn new() -> Self {
        YamlEmitter {
            output: String::new(),
        }
    }

    pub fn emit(mut self, value: &YamlValue) -> String {
        match value {
            YamlValue::Scalar(scalar) => {
                self.output.push_str(scalar);
                self.output.push('\n');
            }
            YamlValue::Mapping(entries) => self.emit_entries(entries, 0),
            YamlValue::Sequence(items) => self.emit_sequence(items, 0),
        }
        self.output
    }

    fn emit_entries(&mut self, entries: &[YamlEntry], indent: usize) {
        for entry in entries {
            match entry {
                YamlEntry::Comment(text) => {
                    self.write_line(indent, &format!("# {text}"));
                }
                YamlEntry::Pair(key, value) => self.emit_pair(key, value, indent),
            }
        }
    }

    fn emit_pair(&mut self, key: &str, value: &YamlValue, indent: usize) {
        match value {
            YamlValue::Scalar(scalar) => {
                self.write_line(indent, &format!("{key}: {scalar}"));
            }
            YamlValue::Mapping(entries) if entries.is_empty() => {
                self.write_line(indent, &format!("{key}: {{}}"));
            }
            YamlValue::Mapping(entries) => {
                self.write_line(indent, &format!("{key}:"));
                self.emit_entries(entries, indent + 2);
            }
            YamlValue::Sequence(items) if items.is_empty() => {
                self.write_line(indent, &format!("{key}: []"));
            }
            YamlValue::Sequence(items) => {
                self.write_line(indent, &format!("{key}:"));
                self.emit_sequence(items, indent + 2);
            }
        }
    }

    fn emit_sequence(&mut self, items: &[YamlValue], indent: usize) {
        for item in items {
            match item {
                YamlValue::Scalar(scalar) => {
                    self.write_line(indent, &format!("- {scalar}"));
                }
                YamlValue::Mapping(entries) if entries.is_empty() => {
                    self.write_line(indent, "- {}");
                }
                YamlValue::Mapping(entries) => {
                    // First pair shares the dash line; the rest align under it.
                    let mut rest = entries.as_slice();
                    while let [YamlEntry::Comment(text), tail @ ..] = rest {
                        self.write_line(indent, &format!("# {text}"));
                        rest = tail;
                    }
                    if let [YamlEntry::Pair(key, value), tail @ ..] = rest {
                        match value {
                            YamlValue::Scalar(scalar) => {
                                self.write_line(indent, &format!("- {key}: {scalar}"));
                            }
                            _ => {
                                self.write_line(indent, &format!("- {key}:"));
                                self.emit_pair_value_block(value, indent + 4);
                            }
                        }
                        self.emit_entries(tail, indent + 2);
                    }
                }
                YamlValue::Sequence(nested) => {
                    self.write_line(indent, "-");
                    self.emit_sequence(nested, indent + 2);
                }
            }
        }
    }

    fn emit_pair_value_block(&mut self, value: &YamlValue, indent: usize) {
        match value {
            YamlValue::Scalar(scalar) => self.write_line(indent, scalar),
            YamlValue::Mapping(entries) => self.emit_entries(entries, indent),
            YamlValue::Sequence(items) => self.emit_sequence(items, indent),
        }
    }

    fn write_line(&mut self, indent: usize, line: &str) {
        for _ in 0..indent {
            self.output.push(' ');
        }
        self.output.push_str(line);
        self.output.push('\n');
    }
}
