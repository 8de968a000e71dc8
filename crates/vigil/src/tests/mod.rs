
use std::time::Duration;

use axum_test::TestServer;
use libvigil::prelude::*;

use crate::api::config::Config;

pub(crate) fn fixtures() -> StaticSource {
  let mut maduro = Entity::new("ofac-12033", Source::OfacSdn, EntityType::Person, "MADURO MOROS, Nicolas");

  maduro.source_id = "12033".to_string();
  maduro.alt_names = vec!["Nicolas MADURO".to_string()];
  maduro.sanctions_info.programs = vec!["VENEZUELA".to_string()];

  let mut acme = Entity::new("eu-9001", Source::EuCsl, EntityType::Business, "Acme Trading Corporation LLC");

  acme.government_ids = vec![GovernmentId {
    id_type: Some("registration".to_string()),
    identifier: "RU-555-777".to_string(),
    country_code: Some("RU".to_string()),
  }];

  StaticSource {
    batches: vec![
      SourceBatch {
        source: Source::OfacSdn,
        entities: vec![maduro],
      },
      SourceBatch {
        source: Source::EuCsl,
        entities: vec![acme],
      },
    ],
  }
}

pub(crate) async fn server() -> TestServer {
  let app = crate::api::routes(&Config::default(), fixtures()).await.unwrap();
  let server = TestServer::new(app).unwrap();

  // The initial refresh runs in the background; wait for readiness so tests
  // are deterministic.
  for _ in 0..100 {
    let health = server.get("/health").await;

    if health.json::<serde_json::Value>()["status"] == "healthy" {
      return server;
    }

    tokio::time::sleep(Duration::from_millis(10)).await;
  }

  panic!("index did not become ready");
}
