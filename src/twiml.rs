//! Call-control markup (TwiML) rendering
//!
//! Only the verbs the bridge emits are modelled: `Say`, `Redirect`, `Pause`
//! and `Connect`/`Stream` with custom parameters.

use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub enum Verb {
    Say {
        text: String,
        language: Option<String>,
    },
    Redirect {
        url: String,
        method: String,
    },
    Pause {
        length: u32,
    },
    Connect {
        stream: Stream,
    },
}

/// `<Stream>` target inside `<Connect>`
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub url: String,
    pub parameters: Vec<(String, String)>,
}

impl Stream {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            parameters: Vec::new(),
        }
    }

    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }
}

/// A `<Response>` document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, text: impl Into<String>, language: Option<&str>) -> Self {
        self.verbs.push(Verb::Say {
            text: text.into(),
            language: language.map(str::to_string),
        });
        self
    }

    pub fn redirect(mut self, url: impl Into<String>) -> Self {
        self.verbs.push(Verb::Redirect {
            url: url.into(),
            method: "POST".to_string(),
        });
        self
    }

    pub fn pause(mut self, length: u32) -> Self {
        self.verbs.push(Verb::Pause { length });
        self
    }

    pub fn connect_stream(mut self, stream: Stream) -> Self {
        self.verbs.push(Verb::Connect { stream });
        self
    }

    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);
        for verb in &self.verbs {
            match verb {
                Verb::Say { text, language } => {
                    match language {
                        Some(lang) => {
                            let _ = write!(xml, r#"<Say language="{}">"#, escape(lang));
                        }
                        None => xml.push_str("<Say>"),
                    }
                    xml.push_str(&escape(text));
                    xml.push_str("</Say>");
                }
                Verb::Redirect { url, method } => {
                    let _ = write!(
                        xml,
                        r#"<Redirect method="{}">{}</Redirect>"#,
                        escape(method),
                        escape(url)
                    );
                }
                Verb::Pause { length } => {
                    let _ = write!(xml, r#"<Pause length="{}"/>"#, length);
                }
                Verb::Connect { stream } => {
                    let _ = write!(xml, r#"<Connect><Stream url="{}">"#, escape(&stream.url));
                    for (name, value) in &stream.parameters {
                        let _ = write!(
                            xml,
                            r#"<Parameter name="{}" value="{}"/>"#,
                            escape(name),
                            escape(value)
                        );
                    }
                    xml.push_str("</Stream></Connect>");
                }
            }
        }
        xml.push_str("</Response>");
        xml
    }
}

/// Escape text for use in XML content and attribute values
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
