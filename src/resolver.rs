//! Node resolution and one-hop link following.

use crate::client::{check_response, KgClient};
use crate::error::Result;
use crate::node::{vocab_key, Node, PropertyValue};
use futures_util::future::try_join_all;

/// Fetch a single graph node by identifier.
///
/// GETs `<base>instances/<id>?stage=<stage>` and converts the response
/// payload into a typed [`Node`]. Errors from the transport and normalizer
/// propagate unchanged.
pub async fn load_node(client: &KgClient, stage: &str, id: &str) -> Result<Node> {
    let mut url = client.endpoint(&format!("instances/{}", id))?;
    url.query_pairs_mut().append_pair("stage", stage);

    let response = client.get_json(url).await?;
    let payload = check_response(response)?;
    Node::from_value(payload)
}

/// Resolve reference-valued properties and inline the nodes they point to.
///
/// For each short property name, in list order: build the vocab key, read the
/// `{"@id": ...}` reference at that key, take the identifier from the URI's
/// last segment, fetch the linked node, and replace the reference with it.
/// One round trip per property, strictly sequential.
///
/// On failure the remaining properties are skipped and replacements already
/// made stay in place; the node is left partially resolved.
pub async fn follow_links(
    client: &KgClient,
    stage: &str,
    node: &mut Node,
    property_names: &[&str],
) -> Result<()> {
    for name in property_names {
        let key = vocab_key(name);
        let id = node.reference_id(&key)?;
        log::debug!("following {} -> {}", name, id);
        let linked = load_node(client, stage, &id).await?;
        node.insert(key, PropertyValue::Node(linked));
    }
    Ok(())
}

/// Concurrent variant of [`follow_links`].
///
/// All reference identifiers are read up front, the linked nodes are fetched
/// concurrently, and replacements are applied only once every fetch has
/// succeeded. Failure semantics differ from the sequential version: the
/// first error wins and the node is left untouched, with no partial
/// resolution.
pub async fn follow_links_concurrent(
    client: &KgClient,
    stage: &str,
    node: &mut Node,
    property_names: &[&str],
) -> Result<()> {
    let mut targets = Vec::with_capacity(property_names.len());
    for name in property_names {
        let key = vocab_key(name);
        let id = node.reference_id(&key)?;
        targets.push((key, id));
    }

    let fetches = targets.iter().map(|(_, id)| load_node(client, stage, id));
    let resolved = try_join_all(fetches).await?;

    for ((key, _), linked) in targets.into_iter().zip(resolved) {
        node.insert(key, PropertyValue::Node(linked));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KgError;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> KgClient {
        KgClient::new(&format!("{}/", server.uri()), "test-token".to_string()).unwrap()
    }

    /// A node with two reference properties pointing at the mock server.
    fn node_with_refs(server: &MockServer) -> Node {
        Node::from_value(json!({
            vocab_key("author"): {"@id": format!("{}/instances/author-1", server.uri())},
            vocab_key("license"): {"@id": format!("{}/instances/license-1", server.uri())},
        }))
        .unwrap()
    }

    async fn mock_instance(server: &MockServer, id: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/instances/{}", id)))
            .and(query_param("stage", "RELEASED"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": body})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_load_node_hits_exact_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instances/abcd-1234"))
            .and(query_param("stage", "RELEASED"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {vocab_key("fullName"): "A dataset"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let node = load_node(&client, "RELEASED", "abcd-1234").await.unwrap();
        assert_eq!(
            node.get(&vocab_key("fullName")).unwrap(),
            &PropertyValue::Scalar(json!("A dataset"))
        );
    }

    #[tokio::test]
    async fn test_load_node_401_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = load_node(&client, "RELEASED", "abcd").await.unwrap_err();
        assert!(matches!(err, KgError::Auth));
    }

    #[tokio::test]
    async fn test_load_node_other_status_carries_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = load_node(&client, "RELEASED", "abcd").await.unwrap_err();
        assert!(matches!(err, KgError::Request(503)));
    }

    #[tokio::test]
    async fn test_follow_links_replaces_references_in_order() {
        let server = MockServer::start().await;
        mock_instance(&server, "author-1", json!({vocab_key("familyName"): "Ramón y Cajal"})).await;
        mock_instance(&server, "license-1", json!({vocab_key("shortName"): "CC-BY"})).await;

        let client = test_client(&server);
        let mut node = node_with_refs(&server);
        follow_links(&client, "RELEASED", &mut node, &["author", "license"])
            .await
            .unwrap();

        // Both references fully replaced by resolved nodes, not stubs
        match node.get(&vocab_key("author")).unwrap() {
            PropertyValue::Node(author) => {
                assert_eq!(
                    author.get(&vocab_key("familyName")).unwrap(),
                    &PropertyValue::Scalar(json!("Ramón y Cajal"))
                );
            }
            other => panic!("author not resolved: {:?}", other),
        }
        assert!(matches!(
            node.get(&vocab_key("license")).unwrap(),
            PropertyValue::Node(_)
        ));

        // Requests went out in input-list order
        let requests = server.received_requests().await.unwrap();
        let paths: Vec<String> = requests.iter().map(|r| r.url.path().to_string()).collect();
        assert_eq!(paths, vec!["/instances/author-1", "/instances/license-1"]);
    }

    #[tokio::test]
    async fn test_follow_links_partial_mutation_on_failure() {
        let server = MockServer::start().await;
        mock_instance(&server, "author-1", json!({vocab_key("familyName"): "Golgi"})).await;
        Mock::given(method("GET"))
            .and(path("/instances/license-1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let mut node = node_with_refs(&server);
        let err = follow_links(&client, "RELEASED", &mut node, &["author", "license"])
            .await
            .unwrap_err();

        // The error is the second property's failure
        assert!(matches!(err, KgError::Request(500)));
        // First property stays replaced; second stays a reference stub
        assert!(matches!(
            node.get(&vocab_key("author")).unwrap(),
            PropertyValue::Node(_)
        ));
        assert!(matches!(
            node.get(&vocab_key("license")).unwrap(),
            PropertyValue::Reference { .. }
        ));
    }

    #[tokio::test]
    async fn test_follow_links_missing_property_fails_before_any_request() {
        let server = MockServer::start().await;
        let client = test_client(&server);
        let mut node = Node::from_value(json!({})).unwrap();
        let err = follow_links(&client, "RELEASED", &mut node, &["author"])
            .await
            .unwrap_err();
        assert!(matches!(err, KgError::MissingProperty(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_follow_links_concurrent_success() {
        let server = MockServer::start().await;
        mock_instance(&server, "author-1", json!({vocab_key("familyName"): "Golgi"})).await;
        mock_instance(&server, "license-1", json!({vocab_key("shortName"): "CC-BY"})).await;

        let client = test_client(&server);
        let mut node = node_with_refs(&server);
        follow_links_concurrent(&client, "RELEASED", &mut node, &["author", "license"])
            .await
            .unwrap();

        assert!(matches!(
            node.get(&vocab_key("author")).unwrap(),
            PropertyValue::Node(_)
        ));
        assert!(matches!(
            node.get(&vocab_key("license")).unwrap(),
            PropertyValue::Node(_)
        ));
    }

    #[tokio::test]
    async fn test_follow_links_concurrent_failure_leaves_node_untouched() {
        let server = MockServer::start().await;
        mock_instance(&server, "author-1", json!({vocab_key("familyName"): "Golgi"})).await;
        Mock::given(method("GET"))
            .and(path("/instances/license-1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let mut node = node_with_refs(&server);
        let before = node.clone();
        let err = follow_links_concurrent(&client, "RELEASED", &mut node, &["author", "license"])
            .await
            .unwrap_err();

        assert!(matches!(err, KgError::Request(500)));
        // All-or-nothing: no partial resolution in the concurrent variant
        assert_eq!(node, before);
    }
}
