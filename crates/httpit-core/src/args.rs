//! 자유 형식 `key=value` / `key:=value` 인자를 요청 본문으로 인코딩.
//!
//! 모든 조각이 `:=`를 포함하고 그 앞에 `=`가 없으면 JSON, 아니면 form.

use url::form_urlencoded;

/// `application/json`
pub const MIME_APPLICATION_JSON: &str = "application/json";
/// `application/x-www-form-urlencoded`
pub const MIME_APPLICATION_FORM: &str = "application/x-www-form-urlencoded";

/// 인자 목록의 인코딩 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgsKind {
    Json,
    Form,
}

impl ArgsKind {
    /// 인코딩에 대응하는 Content-Type
    pub fn content_type(self) -> &'static str {
        match self {
            ArgsKind::Json => MIME_APPLICATION_JSON,
            ArgsKind::Form => MIME_APPLICATION_FORM,
        }
    }
}

/// 인코딩된 인자 본문
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedArgs {
    pub kind: ArgsKind,
    pub body: Vec<u8>,
}

/// 인자 목록 전체의 인코딩 방식 판별
pub fn classify<S: AsRef<str>>(args: &[S]) -> ArgsKind {
    let is_json = args.iter().all(|arg| {
        let arg = arg.as_ref();
        match (arg.find(":="), arg.find('=')) {
            (Some(json_idx), Some(eq_idx)) => eq_idx >= json_idx,
            _ => false,
        }
    });
    if is_json {
        ArgsKind::Json
    } else {
        ArgsKind::Form
    }
}

/// 인자 목록을 본문으로 인코딩. 빈 목록이면 `None`.
pub fn encode_args<S: AsRef<str>>(args: &[S]) -> Option<EncodedArgs> {
    if args.is_empty() {
        return None;
    }
    let kind = classify(args);
    let body = match kind {
        ArgsKind::Json => encode_json(args),
        ArgsKind::Form => encode_form(args),
    };
    Some(EncodedArgs { kind, body })
}

fn encode_json<S: AsRef<str>>(args: &[S]) -> Vec<u8> {
    let mut body = String::from("{");
    for (i, arg) in args.iter().enumerate() {
        let arg = arg.as_ref();
        // classify()에서 `:=` 존재 확인됨
        let idx = arg.find(":=").unwrap_or(arg.len());
        let key = arg[..idx].trim();
        let value = arg.get(idx + 2..).unwrap_or("").trim();

        if i > 0 {
            body.push(',');
        }
        body.push_str(&quote(key));
        body.push(':');
        if need_quote(value) {
            body.push_str(&quote(value));
        } else {
            body.push_str(value);
        }
    }
    body.push('}');
    body.into_bytes()
}

fn encode_form<S: AsRef<str>>(args: &[S]) -> Vec<u8> {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for arg in args {
        let arg = arg.as_ref();
        match arg.split_once('=') {
            Some((k, v)) => {
                serializer.append_pair(k.trim(), v.trim());
            }
            None => {
                serializer.append_key_only(arg.trim());
            }
        }
    }
    serializer.finish().into_bytes()
}

fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// JSON 값을 문자열로 감싸야 하는지
///
/// 불리언(대소문자 무시), 정수, 실수로 읽히는 값, `[...]`/`{...}`는 그대로 쓴다.
pub fn need_quote(v: &str) -> bool {
    let lower = v.to_ascii_lowercase();
    if lower == "true" || lower == "false" {
        return false;
    }
    if v.parse::<i64>().is_ok() {
        return false;
    }
    if v.parse::<f64>().is_ok() {
        return false;
    }

    let bytes = v.as_bytes();
    if bytes.len() <= 1 {
        return true;
    }
    let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
    !((first == b'[' && last == b']') || (first == b'{' && last == b'}'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_cases() {
        let cases: &[(&str, &[&str], ArgsKind, &str)] = &[
            ("form no value", &["foo"], ArgsKind::Form, "foo"),
            ("form one kv", &[" foo=bar"], ArgsKind::Form, "foo=bar"),
            ("form two kv", &["foo=bar ", "bar=baz"], ArgsKind::Form, "foo=bar&bar=baz"),
            ("form escape kv", &["foo=bar=baz"], ArgsKind::Form, "foo=bar%3Dbaz"),
            ("json no value", &["foo:="], ArgsKind::Json, r#"{"foo":""}"#),
            ("json bool true", &[" foo:=true"], ArgsKind::Json, r#"{"foo":true}"#),
            ("json bool False", &["foo:= False"], ArgsKind::Json, r#"{"foo":False}"#),
            ("json int", &["foo:=1 "], ArgsKind::Json, r#"{"foo":1}"#),
            ("json float", &["foo:=1.1"], ArgsKind::Json, r#"{"foo":1.1}"#),
            ("json array", &["foo :=[1]"], ArgsKind::Json, r#"{"foo":[1]}"#),
            ("json object", &[r#"foo:={"bar":"baz"}"#], ArgsKind::Json, r#"{"foo":{"bar":"baz"}}"#),
            ("json string", &["foo:= baz"], ArgsKind::Json, r#"{"foo":"baz"}"#),
            ("json invalid tru", &["foo:=tru"], ArgsKind::Json, r#"{"foo":"tru"}"#),
            ("json invalid fals", &["foo:=fals"], ArgsKind::Json, r#"{"foo":"fals"}"#),
            ("json invalid int", &["foo:=1aa"], ArgsKind::Json, r#"{"foo":"1aa"}"#),
            ("json invalid float", &["foo:=1.1.1"], ArgsKind::Json, r#"{"foo":"1.1.1"}"#),
            ("json two kv", &["foo:=1", "bar:=2"], ArgsKind::Json, r#"{"foo":1,"bar":2}"#),
        ];

        for (name, args, kind, expected) in cases {
            let encoded = encode_args(&args[..]).unwrap();
            assert_eq!(encoded.kind, *kind, "{name}");
            assert_eq!(String::from_utf8(encoded.body).unwrap(), *expected, "{name}");
        }
    }

    #[test]
    fn mixed_fragments_fall_back_to_form() {
        assert_eq!(classify(&["a:=1", "b=2"]), ArgsKind::Form);
        assert_eq!(classify(&["a=b:=c"]), ArgsKind::Form);
        assert_eq!(classify(&["a:=b=c"]), ArgsKind::Json);
    }

    #[test]
    fn json_string_values_are_escaped() {
        let encoded = encode_args(&[r#"msg:=say "hi""#]).unwrap();
        assert_eq!(encoded.body, br#"{"msg":"say \"hi\""}"#.to_vec());
    }

    #[test]
    fn float_literals_stay_unquoted() {
        assert!(!need_quote("NaN"));
        assert!(!need_quote("inf"));
        assert!(!need_quote("-2.5e3"));
    }

    #[test]
    fn empty_args() {
        assert!(encode_args::<&str>(&[]).is_none());
    }
}
