use baladoc_lib::{BuildPipeline, BuildRequest, DocsPayload, FailureKind};

use super::common::{TestEnv, bala_bytes, invocations, zip_bytes};

#[tokio::test]
async fn http_404_is_source_not_found_and_leaves_nothing() {
  let env = TestEnv::new();
  let mut server = mockito::Server::new_async().await;
  let _mock = server
    .mock("GET", "/wso2/greeter/1.2.0/greeter.bala")
    .with_status(404)
    .create_async()
    .await;

  let url = format!("{}/wso2/greeter/1.2.0/greeter.bala", server.url());
  let failure = env.pipeline().build(&BuildRequest::new(&url)).await.unwrap_err();

  assert_eq!(failure.kind, FailureKind::SourceNotFound);
  assert!(failure.message.contains(&url));
  assert!(env.leftovers().is_empty());
}

#[tokio::test]
async fn unresolvable_host_is_source_not_found() {
  let env = TestEnv::new();

  let failure = env
    .pipeline()
    .build(&BuildRequest::new("http://bala-host.invalid/greeter.bala"))
    .await
    .unwrap_err();

  assert_eq!(failure.kind, FailureKind::SourceNotFound);
  assert!(env.leftovers().is_empty());
}

#[tokio::test]
async fn corrupt_bala_is_infrastructure_failure() {
  let env = TestEnv::new();
  let mut server = mockito::Server::new_async().await;
  let _mock = server
    .mock("GET", "/greeter.bala")
    .with_body("<html>maintenance</html>")
    .create_async()
    .await;

  let failure = env
    .pipeline()
    .build(&BuildRequest::new(format!("{}/greeter.bala", server.url())))
    .await
    .unwrap_err();

  assert_eq!(failure.kind, FailureKind::Infrastructure);
  assert!(env.leftovers().is_empty());
}

#[tokio::test]
async fn bala_without_manifest_is_infrastructure_failure() {
  let env = TestEnv::new();
  let mut server = mockito::Server::new_async().await;
  let _mock = server
    .mock("GET", "/greeter.bala")
    .with_body(zip_bytes(&[("Ballerina.toml", "[package]")]))
    .create_async()
    .await;

  let failure = env
    .pipeline()
    .build(&BuildRequest::new(format!("{}/greeter.bala", server.url())))
    .await
    .unwrap_err();

  assert_eq!(failure.kind, FailureKind::Infrastructure);
  assert!(failure.message.contains("package.json"), "{}", failure.message);
  assert!(env.leftovers().is_empty());
}

#[tokio::test]
async fn concurrent_builds_do_not_interfere() {
  let env = TestEnv::new();
  let mut server = mockito::Server::new_async().await;
  let _mock = server
    .mock("GET", "/missing.bala")
    .with_status(404)
    .expect(8)
    .create_async()
    .await;

  let pipeline: BuildPipeline = env.pipeline();
  let url = format!("{}/missing.bala", server.url());
  let handles: Vec<_> = (0..8)
    .map(|_| {
      let pipeline = pipeline.clone();
      let request = BuildRequest::new(&url);
      tokio::spawn(async move { pipeline.build(&request).await })
    })
    .collect();

  for handle in handles {
    let failure = handle.await.unwrap().unwrap_err();
    assert_eq!(failure.kind, FailureKind::SourceNotFound);
  }
  assert!(env.leftovers().is_empty());
}

#[cfg(unix)]
mod with_toolchain {
  use super::*;

  #[tokio::test]
  async fn builds_docs_with_matching_toolchain() {
    let env = TestEnv::new();
    let toolchain = env.install_toolchain("ballerina-2201.4.1", 0);
    let other = env.install_toolchain("ballerina-2201.8.0", 0);

    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/wso2/greeter/1.2.0/greeter.bala")
      .with_body(bala_bytes("2201.4.1-20230215-120000-abc"))
      .create_async()
      .await;

    let url = format!("{}/wso2/greeter/1.2.0/greeter.bala", server.url());
    let success = env.pipeline().build(&BuildRequest::new(&url)).await.unwrap();

    mock.assert_async().await;
    assert_eq!(success.toolchain_version, "2201.4.1");
    assert_eq!(success.exit_code, Some(0));
    assert_eq!(success.payload, DocsPayload::default());
    assert_eq!(
      serde_json::to_value(&success.payload).unwrap(),
      serde_json::json!({ "apiDocJsons": [] })
    );

    let calls = invocations(&toolchain);
    assert_eq!(calls.len(), 1);
    let args: Vec<&str> = calls[0].split(' ').collect();
    assert_eq!(args[0], "doc");
    assert!(args[1].starts_with(env.temp_root.path().to_str().unwrap()));
    assert!(args[1].ends_with(".bala"));
    assert!(invocations(&other).is_empty());

    assert!(env.leftovers().is_empty());
  }

  #[tokio::test]
  async fn missing_toolchain_never_runs_a_process() {
    let env = TestEnv::new();
    let installed = env.install_toolchain("ballerina-1.0.0", 0);

    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("GET", "/greeter.bala")
      .with_body(bala_bytes("2201.4.1"))
      .create_async()
      .await;

    let failure = env
      .pipeline()
      .build(&BuildRequest::new(format!("{}/greeter.bala", server.url())))
      .await
      .unwrap_err();

    assert_eq!(failure.kind, FailureKind::Infrastructure);
    assert!(invocations(&installed).is_empty());
    assert!(env.leftovers().is_empty());
  }

  #[tokio::test]
  async fn output_written_by_toolchain_is_cleaned_up() {
    use std::os::unix::fs::PermissionsExt;

    let env = TestEnv::new();
    let root = env.dists.path().join("ballerina-2201.4.1");
    std::fs::create_dir_all(root.join("bin")).unwrap();
    let bin = root.join("bin").join("bal");
    std::fs::write(
      &bin,
      "#!/bin/sh\nmkdir -p target/apidocs/greeter\necho '{}' > target/apidocs/greeter/api-doc.json\n",
    )
    .unwrap();
    std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();

    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("GET", "/greeter.bala")
      .with_body(bala_bytes("2201.4.1"))
      .create_async()
      .await;

    env
      .pipeline()
      .build(&BuildRequest::new(format!("{}/greeter.bala", server.url())))
      .await
      .unwrap();

    assert!(env.leftovers().is_empty());
  }
}
