//! End-to-end batch test: folder enumeration feeding the dispatcher, with
//! real resolutions against a mock host and a no-op transfer agent.

use std::sync::Arc;

use fdget_core::{
    Aria2Agent, DownloadDispatcher, FolderEnumerator, LinkResolver, Pacer, SiteProfile, TaskError,
};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GRID_STYLE: &str =
    "width:80px;height:26px;font:bold 13px Arial;background:#ccc;text-align:left;direction:ltr;";

/// Mounts the full three-step flow for one item. Each item sets a distinct
/// session cookie and its POSTs require it back, so cookie bleed between
/// concurrent sessions would fail the mock match.
async fn mount_item(server: &MockServer, item: &str, cookie: &str, resolvable: bool) {
    let item_path = format!("/f/{item}");

    Mock::given(method("GET"))
        .and(path(item_path.clone()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", format!("sess={cookie}; Path=/").as_str())
                .set_body_string("<html>landing</html>"),
        )
        .mount(server)
        .await;

    let challenge = format!(
        r#"<input type="hidden" name="op" value="download2">
<input type="hidden" name="id" value="{item}">
<div style="{GRID_STYLE}">
<span style="padding-left:20px;">2</span>
<span style="padding-left:0px;">1</span>
</div>"#
    );
    // Requiring the item's own cookie back means cookie bleed between
    // concurrent sessions fails the match.
    Mock::given(method("POST"))
        .and(path(item_path.clone()))
        .and(body_string_contains("op=download1"))
        .and(header("cookie", format!("sess={cookie}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(challenge))
        .mount(server)
        .await;

    let final_body = if resolvable {
        format!(
            r#"<nobr>{item}.bin</nobr><a href="{}/fsd/{item}.bin">go</a>"#,
            server.uri()
        )
    } else {
        "<html><body>limit reached</body></html>".to_string()
    };
    Mock::given(method("POST"))
        .and(path(item_path))
        .and(body_string_contains("op=download2"))
        .and(body_string_contains("code=12"))
        .and(header("cookie", format!("sess={cookie}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(final_body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_folder_batch_end_to_end() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let profile = Arc::new(SiteProfile::for_host_marker("/f/"));

    let folder_body = format!(
        r#"<h1>Pack</h1><table>
<tr><td><a href="{uri}/f/item1">1</a></td></tr>
<tr><td><a href="{uri}/f/item2">2</a></td></tr>
<tr><td><a href="{uri}/f/item3">3</a></td></tr>
</table>"#
    );
    Mock::given(method("GET"))
        .and(path("/f/folder/xyz/Pack"))
        .respond_with(ResponseTemplate::new(200).set_body_string(folder_body))
        .mount(&server)
        .await;

    mount_item(&server, "item1", "one", true).await;
    mount_item(&server, "item2", "two", true).await;
    // Third item resolves its challenge but the host withholds the link.
    mount_item(&server, "item3", "three", false).await;

    let listing = FolderEnumerator::new(Arc::clone(&profile))
        .enumerate(&format!("{uri}/f/folder/xyz/Pack"))
        .await
        .unwrap();
    assert_eq!(listing.folder_name, "Pack");
    assert_eq!(listing.item_urls.len(), 3);

    let resolver =
        LinkResolver::new(Arc::clone(&profile)).with_challenge_pacer(Pacer::disabled());
    // `true` stands in for aria2c: exits zero, transfers nothing.
    let agent = Arc::new(Aria2Agent::new(profile.user_agent.clone()).with_program("true"));
    let dispatcher =
        DownloadDispatcher::new(2, Arc::new(resolver), agent, Pacer::disabled()).unwrap();

    let dest = tempfile::tempdir().unwrap();
    let report = dispatcher
        .dispatch(&listing.item_urls, dest.path())
        .await
        .unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.completed(), 2);
    assert_eq!(report.failed(), 1);

    let failed = report
        .outcomes
        .iter()
        .find(|outcome| outcome.result.is_err())
        .unwrap();
    assert!(failed.url.ends_with("/f/item3"));
    assert!(matches!(
        failed.result,
        Err(TaskError::Resolve(
            fdget_core::ResolveError::NoFinalLink { .. }
        ))
    ));
}

#[tokio::test]
async fn test_unreachable_item_isolated_from_batch() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let profile = Arc::new(SiteProfile::for_host_marker("/f/"));

    mount_item(&server, "good1", "g1", true).await;
    // No mocks for "missing": wiremock answers 404 and the item fails fast.

    let resolver =
        LinkResolver::new(Arc::clone(&profile)).with_challenge_pacer(Pacer::disabled());
    let agent = Arc::new(Aria2Agent::new(profile.user_agent.clone()).with_program("true"));
    let dispatcher =
        DownloadDispatcher::new(1, Arc::new(resolver), agent, Pacer::disabled()).unwrap();

    let dest = tempfile::tempdir().unwrap();
    let urls = vec![format!("{uri}/f/missing"), format!("{uri}/f/good1")];
    let report = dispatcher.dispatch(&urls, dest.path()).await.unwrap();

    assert_eq!(report.total(), 2);
    assert_eq!(report.completed(), 1);
    assert_eq!(report.failed(), 1);
}
