//! Typed FFmpeg filter graphs.
//!
//! Graphs are assembled from [`Filter`] nodes grouped into [`FilterChain`]s
//! and only turned into text when handed to `ffmpeg -filter_complex`. Option
//! values are escaped on the way out, so labels and paths never need manual
//! quoting.

use std::fmt;

/// A single filter invocation such as `crop=320:180`
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    name: String,
    args: Vec<FilterArg>,
}

#[derive(Debug, Clone, PartialEq)]
enum FilterArg {
    Positional(String),
    Named(String, String),
}

impl Filter {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append a positional option value
    pub fn arg<V: ToString>(mut self, value: V) -> Self {
        self.args.push(FilterArg::Positional(value.to_string()));
        self
    }

    /// Append a `key=value` option
    pub fn named<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.args.push(FilterArg::Named(key.into(), value.to_string()));
        self
    }

    // Convenience constructors for the filters this crate emits.

    /// `scale=w:h`
    pub fn scale<W: ToString, H: ToString>(width: W, height: H) -> Self {
        Self::new("scale").arg(width).arg(height)
    }

    /// `crop=w:h` (centered) or `crop=w:h:x:y`
    pub fn crop(width: u32, height: u32, offset: Option<(u32, u32)>) -> Self {
        let filter = Self::new("crop").arg(width).arg(height);
        match offset {
            Some((x, y)) => filter.arg(x).arg(y),
            None => filter,
        }
    }

    /// `overlay=x:y`
    pub fn overlay<X: ToString, Y: ToString>(x: X, y: Y) -> Self {
        Self::new("overlay").arg(x).arg(y)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            f.write_str(if i == 0 { "=" } else { ":" })?;
            match arg {
                FilterArg::Positional(value) => f.write_str(&escape_value(value))?,
                FilterArg::Named(key, value) => write!(f, "{}={}", key, escape_value(value))?,
            }
        }
        Ok(())
    }
}

/// A linear chain of filters with labelled input and output pads
///
/// Pads are given without brackets (`"0:v"`, `"bg"`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    inputs: Vec<String>,
    filters: Vec<Filter>,
    outputs: Vec<String>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input<S: Into<String>>(mut self, pad: S) -> Self {
        self.inputs.push(pad.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn output<S: Into<String>>(mut self, pad: S) -> Self {
        self.outputs.push(pad.into());
        self
    }
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pad in &self.inputs {
            write!(f, "[{}]", pad)?;
        }
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", filter)?;
        }
        for pad in &self.outputs {
            write!(f, "[{}]", pad)?;
        }
        Ok(())
    }
}

/// A complete `-filter_complex` graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterGraph {
    chains: Vec<FilterChain>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chain: FilterChain) {
        self.chains.push(chain);
    }

    pub fn chain(mut self, chain: FilterChain) -> Self {
        self.push(chain);
        self
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chain) in self.chains.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}", chain)?;
        }
        Ok(())
    }
}

/// Escape an option value for both the option parser and the graph parser.
fn escape_value(value: &str) -> String {
    let mut option_level = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '\'' | ':') {
            option_level.push('\\');
        }
        option_level.push(c);
    }

    let mut graph_level = String::with_capacity(option_level.len());
    for c in option_level.chars() {
        if matches!(c, '\\' | '\'' | '[' | ']' | ',' | ';') {
            graph_level.push('\\');
        }
        graph_level.push(c);
    }
    graph_level
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_rendering() {
        let filter = Filter::scale(320, 180).named("force_original_aspect_ratio", "increase");
        assert_eq!(filter.to_string(), "scale=320:180:force_original_aspect_ratio=increase");
        assert_eq!(Filter::new("setsar").arg(1).to_string(), "setsar=1");
        assert_eq!(Filter::new("null").to_string(), "null");
        assert_eq!(Filter::crop(320, 180, Some((0, 30))).to_string(), "crop=320:180:0:30");
    }

    #[test]
    fn test_chain_and_graph_rendering() {
        let graph = FilterGraph::new()
            .chain(
                FilterChain::new()
                    .input("0:v")
                    .filter(Filter::scale(320, 240))
                    .filter(Filter::crop(320, 180, None))
                    .output("v0"),
            )
            .chain(
                FilterChain::new()
                    .input("bg")
                    .input("v0")
                    .filter(Filter::overlay(20, 20))
                    .output("grid"),
            );

        assert_eq!(
            graph.to_string(),
            "[0:v]scale=320:240,crop=320:180[v0];[bg][v0]overlay=20:20[grid]"
        );
    }

    #[test]
    fn test_expressions_pass_through() {
        let pad = Filter::new("pad").arg("ceil(iw/2)*2").arg("ceil(ih/2)*2");
        assert_eq!(pad.to_string(), "pad=ceil(iw/2)*2:ceil(ih/2)*2");
    }

    #[test]
    fn test_special_characters_are_escaped() {
        let filter = Filter::new("drawtext").named("text", "a:b");
        assert_eq!(filter.to_string(), "drawtext=text=a\\\\:b");

        let filter = Filter::new("drawtext").named("text", "x,y");
        assert_eq!(filter.to_string(), "drawtext=text=x\\,y");
    }
}
