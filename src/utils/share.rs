use crate::models::Share;

/// Reads a share link and its optional password from pasted text such as
/// `链接：https://wwx.lanzoux.com/iAbc 密码：abcd`.
pub fn parse_share(text: &str) -> Option<Share> {
    let start = text.find("http")?;
    let mut items = text[start..].split_whitespace();

    let url = items.next()?.to_owned();
    let rest: String = items.collect();

    let pwd = if rest.contains([':', '：']) {
        rest.replacen('：', ":", 1)
            .rsplit(':')
            .next()
            .filter(|pwd| !pwd.is_empty())
            .map(str::to_owned)
    } else {
        None
    };

    Some(Share { url, pwd })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_link_with_password() {
        let share = parse_share("链接：https://wwx.lanzoux.com/b0f19ab 密码：ab12").unwrap();
        assert_eq!(share.url, "https://wwx.lanzoux.com/b0f19ab");
        assert_eq!(share.pwd.as_deref(), Some("ab12"));

        let share = parse_share("https://wwx.lanzoui.com/iAbc 提取码 : 7x9k").unwrap();
        assert_eq!(share.pwd.as_deref(), Some("7x9k"));
    }

    #[test]
    fn should_parse_link_without_password() {
        let share = parse_share("https://wwx.lanzoux.com/iXyz\n").unwrap();
        assert_eq!(share.url, "https://wwx.lanzoux.com/iXyz");
        assert_eq!(share.pwd, None);
        assert_eq!(parse_share("nothing to share"), None);
    }
}
