#![cfg(test)]

use std::{collections::HashMap, sync::Mutex};

use indexmap::IndexMap;
use url::Url;

use super::*;

#[derive(Default)]
struct RecordingFetcher {
    responses: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl RecordingFetcher {
    fn with(url: &str, body: &str) -> Self {
        Self {
            responses: HashMap::from([(url.to_owned(), body.to_owned())]),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ScriptFetcher for RecordingFetcher {
    async fn fetch_text(&self, url: &str) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push(url.to_owned());
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("404 for {url}"))
    }
}

fn form(pairs: &[(&str, &str)]) -> Option<IndexMap<String, String>> {
    Some(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

fn post(url: &str, pairs: &[(&str, &str)]) -> AjaxDescriptor {
    AjaxDescriptor {
        method: "post".into(),
        url: url.into(),
        data: form(pairs),
    }
}

const FOLDER_PAGE: &str = r#"<html><head>
<script type="text/javascript" src="https://assets.woozooo.com/assets/jquery.js"></script>
</head><body>
<div id="infos"></div>
<script type="text/javascript">
    var pgs;
    var ib4yq4 = '1675843419';
    var _h = 'a6f4d1b2c3';
    pgs =1;
    function sms(x){ document.getElementById('sms').innerHTML = x; }
    $(document).keyup(function(e){ if(e.keyCode == 13){ more(); } });
    function file(){
        $.ajax({
            type : 'post',
            url : '/filemoreajax.php',
            data : { 'lx':2, 'fid':1234567, 'uid':'987654', 'pg':pgs, 'rep':'0', 't':ib4yq4, 'k':_h, 'up':1, 'vip':'0', 'webfoldersign':'' },
            dataType : 'json',
            success:function(msg){ if(msg.zt == 1){ pgs++; } },
            error:function(){ document.getElementById('infos').innerHTML = 'err'; }
        });
    }
    file();
    function more(){ file(); }
    document.title = 'folder';
</script>
</body></html>"#;

const FOLDER_PWD_PAGE: &str = r#"<html><body>
<script type="text/javascript">
    var pgs;
    var ib4yq4 = '1675843419';
    var _h = 'a6f4d1b2c3';
    pgs =1;
    function sms(x){ document.getElementById('sms').innerHTML = x; }
    $(document).keyup(function(e){ if(e.keyCode == 13){ file(); } });
    function file(){
        var pwd = document.getElementById('pwd').value;
        var t = ib4yq4;
        $.ajax({
            type : 'post',
            url : '/filemoreajax.php',
            data : { 'lx':2, 'fid':1234567, 'uid':'987654', 'pg':pgs, 'rep':'0', 't':t, 'k':_h, 'up':1, 'ls':1, 'pwd':pwd },
            dataType : 'json',
            success:function(msg){ if(msg.zt == 1){ pgs++; } }
        });
    }
    document.title = 'folder';
</script>
</body></html>"#;

const FILE_PAGE: &str = r#"<html><body>
<div id="go"></div>
<script type="text/javascript">
    var ajaxdata = '?ctdf';
    var aihidcms = '5s4r';
    var iucjdsd = '';
    var kdns = 1;
    $.ajax({
        type : 'post',
        url : '/ajaxm.php',
        data : { 'action':'downprocess','signs':ajaxdata,'sign':aihidcms,'websign':iucjdsd,'websignkey':'Fs3c','ves':1,'kd':kdns },
        dataType : 'json',
        success:function(msg){ if(msg.zt == 1){ document.getElementById('go').innerHTML = 'ok'; } }
    });
    function cpa(){ document.getElementById('sub').style.display = 'none'; }
</script>
</body></html>"#;

const FILE_PWD_PAGE: &str = r#"<html><body>
<input type="text" id="pwd">
<script type="text/javascript">
    function down_p(){
        var skdklds = 'UDZSaAg_b';
        var pwd = document.getElementById('pwd').value;
        $.ajax({
            type : 'post',
            url : '/ajaxm.php',
            data : 'action=downprocess&sign='+skdklds+'&p='+pwd+'&kd=1',
            dataType : 'json',
            success:function(msg){ if(msg.zt == 1){ show(msg); } }
        });
    }
</script>
</body></html>"#;

const VALIDATION_PAGE: &str = r##"<html><body>
<div id="sub"><div class="btn" onclick="down_r(2)">验证并下载</div></div>
<script type="text/javascript">
    function down_r(vs){
        $("#sub").text("提交中...");
        $.ajax({
            type : 'post',
            url : '/ajax.php',
            data : { 'file_id':6789, 'sign':'abc123', 'el':vs },
            dataType : 'json',
            success:function(msg){ if(msg.zt == 1){ show(msg); } }
        });
    }
</script>
</body></html>"##;

const FILE_MORE_PAGE: &str = r#"<html><body>
<script type="text/javascript" src="/js/common.js"></script>
<script type="text/javascript" src="https://assets.woozooo.com/assets/jquery.js"></script>
<script type="text/javascript">
    function more(){ pgs++; file(); }
    function file(){
        $.ajax({
            type : 'post',
            url : '/doupload.php',
            data : { 'task':47, 'folder_id':folder_id, 'pg':pgs, 'vei':vei },
            dataType : 'json',
            success:function(msg){ $.each(msg.text, function(i, item){ show(item); }); }
        });
    }
</script>
</body></html>"#;

#[test_log::test(tokio::test)]
async fn should_extract_folder_request() {
    let fetcher = RecordingFetcher::default();
    let matcher = Matcher::new(&fetcher);

    let descriptor = matcher.parse_folder_ajax(FOLDER_PAGE).await.unwrap();

    assert_eq!(
        descriptor,
        post(
            "/filemoreajax.php",
            &[
                ("lx", "2"),
                ("fid", "1234567"),
                ("uid", "987654"),
                ("pg", "1"),
                ("rep", "0"),
                ("t", "1675843419"),
                ("k", "a6f4d1b2c3"),
                ("up", "1"),
                ("vip", "0"),
                ("webfoldersign", ""),
            ]
        )
    );
    let keys = descriptor.data.unwrap().into_keys().collect::<Vec<_>>();
    assert_eq!(keys[..3], ["lx", "fid", "uid"]);
    assert!(fetcher.calls().is_empty());
}

#[test_log::test(tokio::test)]
async fn should_inject_folder_password() {
    let fetcher = RecordingFetcher::default();
    let matcher = Matcher::new(&fetcher);

    let descriptor = matcher
        .parse_folder_pwd_ajax(FOLDER_PWD_PAGE, "abcd")
        .await
        .unwrap();

    assert_eq!(descriptor.url, "/filemoreajax.php");
    assert_eq!(descriptor.param("pwd"), Some("abcd"));
    assert_eq!(descriptor.param("t"), Some("1675843419"));
    assert_eq!(descriptor.param("pg"), Some("1"));
    assert_eq!(descriptor.param("ls"), Some("1"));
}

#[test_log::test(tokio::test)]
async fn should_replace_passwords_written_on_the_page() {
    let fetcher = RecordingFetcher::default();
    let matcher = Matcher::new(&fetcher);

    let page = FOLDER_PWD_PAGE.replace("document.getElementById('pwd').value", "'0000'");
    let descriptor = matcher.parse_folder_pwd_ajax(&page, "abcd").await.unwrap();
    assert_eq!(descriptor.param("pwd"), Some("abcd"));

    let page = FILE_PWD_PAGE.replace("document.getElementById('pwd').value", "'0000'");
    let descriptor = matcher.parse_pwd_ajax(&page, "abcd").await.unwrap();
    assert_eq!(descriptor.param("p"), Some("abcd"));
}

#[test_log::test(tokio::test)]
async fn should_ignore_outer_statements_shadowing_the_request() {
    let fetcher = RecordingFetcher::default();
    let matcher = Matcher::new(&fetcher);

    let page = FOLDER_PWD_PAGE
        .replace(
            "    pgs =1;",
            "    pgs =1;\n    var t = 'outer';\n    var pwd = '0000';",
        )
        .replace("    document.title = 'folder';", "    var t = 'after';\n    pgs = 9;");
    let descriptor = matcher.parse_folder_pwd_ajax(&page, "abcd").await.unwrap();

    assert_eq!(descriptor.param("pwd"), Some("abcd"));
    assert_eq!(descriptor.param("t"), Some("1675843419"));
    assert_eq!(descriptor.param("pg"), Some("1"));
}

#[test_log::test(tokio::test)]
async fn should_extract_file_request() {
    let fetcher = RecordingFetcher::default();
    let descriptor = Matcher::new(&fetcher).parse_ajax(FILE_PAGE).await.unwrap();

    assert_eq!(
        descriptor,
        post(
            "/ajaxm.php",
            &[
                ("action", "downprocess"),
                ("signs", "?ctdf"),
                ("sign", "5s4r"),
                ("websign", ""),
                ("websignkey", "Fs3c"),
                ("ves", "1"),
                ("kd", "1"),
            ]
        )
    );
}

#[test_log::test(tokio::test)]
async fn should_split_query_string_data() {
    let fetcher = RecordingFetcher::default();
    let matcher = Matcher::new(&fetcher);

    let descriptor = matcher.parse_pwd_ajax(FILE_PWD_PAGE, "abcd").await.unwrap();
    assert_eq!(
        descriptor,
        post(
            "/ajaxm.php",
            &[
                ("action", "downprocess"),
                ("sign", "UDZSaAg_b"),
                ("p", "abcd"),
                ("kd", "1"),
            ]
        )
    );

    let descriptor = matcher
        .parse_pwd_ajax(FILE_PWD_PAGE, "a\"b$1")
        .await
        .unwrap();
    assert_eq!(descriptor.param("p"), Some("a\"b$1"));
}

#[test_log::test(tokio::test)]
async fn should_bind_challenge_argument() {
    let fetcher = RecordingFetcher::default();
    let matcher = Matcher::new(&fetcher);

    let descriptor = matcher.parse_validate_ajax(VALIDATION_PAGE).await.unwrap();
    assert_eq!(
        descriptor,
        Some(post(
            "/ajax.php",
            &[("file_id", "6789"), ("sign", "abc123"), ("el", "2")]
        ))
    );

    let plain = VALIDATION_PAGE.replace("提交中", "loading");
    assert_eq!(matcher.parse_validate_ajax(&plain).await, Ok(None));
}

#[test_log::test(tokio::test)]
async fn should_run_external_scripts_first() {
    let fetcher = RecordingFetcher::with(
        "https://pc.woozooo.com/js/common.js",
        "var vei = 'UlNXVVVb'",
    );
    let matcher = Matcher::new(&fetcher)
        .with_base_url(Url::parse("https://pc.woozooo.com/mydisk.php").unwrap());

    let scripts = matcher.format_script(FILE_MORE_PAGE).await;
    assert_eq!(scripts.prelude, "var vei = \"UlNXVVVb\";\n");
    assert!(scripts.page.starts_with("function more() {\n"));
    assert_eq!(fetcher.calls(), vec!["https://pc.woozooo.com/js/common.js"]);

    let descriptor = matcher.parse_file_more_ajax(FILE_MORE_PAGE).await.unwrap();
    assert_eq!(
        descriptor,
        post(
            "/doupload.php",
            &[("task", "47"), ("folder_id", ""), ("pg", "1"), ("vei", "UlNXVVVb")]
        )
    );
}

#[test_log::test(tokio::test)]
async fn should_tolerate_missing_external_scripts() {
    let fetcher = RecordingFetcher::default();
    let matcher = Matcher::new(&fetcher)
        .with_base_url(Url::parse("https://pc.woozooo.com/mydisk.php").unwrap());

    let scripts = matcher.format_script(FILE_MORE_PAGE).await;
    assert_eq!(scripts.prelude, "");
    assert_eq!(fetcher.calls().len(), 1);

    let err = matcher.parse_file_more_ajax(FILE_MORE_PAGE).await.unwrap_err();
    assert_eq!(err, ExtractError::Eval(EvalError::Reference("vei".into())));
}

#[test_log::test(tokio::test)]
async fn should_skip_pages_without_inline_scripts() {
    let fetcher = RecordingFetcher::default();
    let html = r#"<html><body><script src="/js/common.js"></script><p>x</p></body></html>"#;

    let scripts = Matcher::new(&fetcher).format_script(html).await;
    assert!(scripts.is_empty());
    assert!(fetcher.calls().is_empty());
}

#[test_log::test(tokio::test)]
async fn should_dispatch_by_page_shape() {
    let fetcher = RecordingFetcher::default();
    let matcher = Matcher::new(&fetcher);

    let shape: PageShape = "file_with_password".parse().unwrap();
    assert_eq!(shape, PageShape::FileWithPassword);
    assert_eq!(PageShape::FileMore.to_string(), "file_more");

    let descriptor = matcher.parse_page(FILE_PWD_PAGE, shape, "abcd").await.unwrap();
    assert_eq!(descriptor.unwrap().param("p"), Some("abcd"));

    let descriptor = matcher
        .parse_page(FILE_PAGE, PageShape::Validation, "")
        .await
        .unwrap();
    assert_eq!(descriptor, None);
}

#[test_log::test(tokio::test)]
async fn should_report_stale_pages() {
    let fetcher = RecordingFetcher::default();
    let matcher = Matcher::new(&fetcher);

    let err = matcher.parse_folder_ajax(FILE_PAGE).await.unwrap_err();
    assert_eq!(
        err,
        ExtractError::PatternNotFound {
            recipe: "folder",
            part: Part::Variable
        }
    );

    let html = "<html><body><script>var a = 1; $.ajax({ type: 'post', url: });</script></body></html>";
    let err = matcher.parse_ajax(html).await.unwrap_err();
    assert_eq!(
        err,
        ExtractError::PatternNotFound {
            recipe: "file",
            part: Part::Variable
        }
    );

    let html = "<html><body><script>var a = 1; $.ajax({ type: 'post', url: missing });</script></body></html>";
    let err = matcher.parse_ajax(html).await.unwrap_err();
    assert_eq!(err, ExtractError::Eval(EvalError::Reference("missing".into())));

    let html = "<html><body><script>var a = 1; $.ajax({ type: 'post', data: {} });</script></body></html>";
    let err = matcher.parse_ajax(html).await.unwrap_err();
    assert_eq!(err, ExtractError::Shape("url is missing".into()));
}

#[test]
fn should_flatten_request_values() {
    let scripts = PageScripts {
        page: "var n = null;\n$.ajax({ url: \"/x\", method: \"GET\", data: { a: true, b: n, c: 1.5 } });\n"
            .into(),
        prelude: String::new(),
    };
    let descriptor = extract(&scripts, &Recipe::file()).unwrap();
    assert_eq!(
        descriptor,
        AjaxDescriptor {
            method: "GET".into(),
            url: "/x".into(),
            data: form(&[("a", "true"), ("b", ""), ("c", "1.5")]),
        }
    );

    let scripts = PageScripts {
        page: "var n = 1;\n$.ajax({ url: \"/x\", data: { a: [1] } });\n".into(),
        prelude: String::new(),
    };
    assert!(matches!(
        extract(&scripts, &Recipe::file()),
        Err(ExtractError::Shape(_))
    ));
}

#[test]
fn should_collect_scripts_in_document_order() {
    let base = Url::parse("https://pc.woozooo.com/mydisk.php").unwrap();
    let html = r#"<html><head>
        <script src="/js/common.js"></script>
        <script src="https://hm.baidu.com/hm.js?x"></script>
        <script src="">var a = 1;</script>
    </head><body><script>var b = 2;</script></body></html>"#;

    let scripts = ScriptSet::from_html(html, Some(&base));
    assert_eq!(scripts.sources, vec!["https://pc.woozooo.com/js/common.js"]);
    assert_eq!(scripts.inline, vec!["var a = 1;", "var b = 2;"]);
}
