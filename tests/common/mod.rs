//! Shared fixtures: image lists as produced by scanning real manifest sets,
//! and a fake transfer that records calls.

#![allow(dead_code)]

pub mod registry;

use async_trait::async_trait;
use image_relocator::{ImageList, ImageRecord, ImageTransfer, RegistryError};
use std::sync::Mutex;

const CONTAINERS: &[&str] = &["spec", "template", "spec", "containers", "image"];
const INIT_CONTAINERS: &[&str] = &["spec", "template", "spec", "initContainers", "image"];

fn record(manifest: &str, manifest_digest: &str, node_path: &[&str], reference: &str) -> ImageRecord {
    ImageRecord::from_reference(
        manifest,
        manifest_digest,
        node_path.iter().map(|s| s.to_string()).collect(),
        reference,
    )
    .expect("fixture reference must parse")
}

pub struct Fixture {
    pub description: &'static str,
    pub images: ImageList,
}

pub fn basic() -> Fixture {
    let list = "basic/list.json";
    let list_digest = "577caeee80cfa690caf25bcdd4b1919b99d2860eb351c48e81b46b9e4b52aea5";
    let deployment = "basic/deployment.json";
    let deployment_digest = "8d85ce5a5de4085bb841cee0402022fcd03f86606a67d572e62012ce4420668c";

    Fixture {
        description: "basic",
        images: ImageList::from(vec![
            record(list, list_digest, &["spec", "containers", "image"], "nginx"),
            record(list, list_digest, CONTAINERS, "redis"),
            record(list, list_digest, &["items", "spec", "containers", "image"], "redis"),
            record(deployment, deployment_digest, CONTAINERS, "nginx:1.16.1"),
        ]),
    }
}

pub fn contour() -> Fixture {
    let certgen = "contour/02-job-certgen.yaml";
    let contour = "contour/03-contour.yaml";
    let envoy = "contour/03-envoy.yaml";
    let envoy_digest = "e83cd3f98ddbbd91374511c8ce1e437d938ffc8ea8d50bc6d4ccdbf224e53ed4";
    let contour_image = "ghcr.io/projectcontour/contour:v1.24.1";

    Fixture {
        description: "contour",
        images: ImageList::from(vec![
            record(
                certgen,
                "ba03dc02890e0ca080f12f03fd06a1d4f6b76ff75be0346ee27c9aa73c6d1d31",
                CONTAINERS,
                contour_image,
            ),
            record(
                contour,
                "a9de49647bab938407cb76c29f6b9465690bedb0b99a10736136f982d349d928",
                CONTAINERS,
                contour_image,
            ),
            record(envoy, envoy_digest, CONTAINERS, contour_image),
            record(envoy, envoy_digest, CONTAINERS, "docker.io/envoyproxy/envoy:v1.25.1"),
            record(envoy, envoy_digest, INIT_CONTAINERS, contour_image),
        ]),
    }
}

pub fn flux() -> Fixture {
    let manifest = "flux/flux.yaml";
    let digest = "39ad63101dbb2ead069ca6185bd44f99f52b8513682d6002109c9b0db23f73b5";

    Fixture {
        description: "flux",
        images: ImageList::from(vec![
            record(manifest, digest, CONTAINERS, "ghcr.io/fluxcd/kustomize-controller:v0.30.0"),
            record(manifest, digest, CONTAINERS, "ghcr.io/fluxcd/source-controller:v0.31.0"),
        ]),
    }
}

pub const TEKTON_CONTROLLER_DIGEST: &str =
    "sha256:dc7bc7d6607466b502d8dc22ba0598461d7477f608ab68aaff1ff4dedaa04f81";
pub const TEKTON_WEBHOOK_DIGEST: &str =
    "sha256:6b8aadbdcede63969ecb719e910b55b7681d87110fc0bf92ca4ee943042f620b";

pub fn tekton() -> Fixture {
    let manifest = "tekton/base/tekton-base.yaml";
    let digest = "c2cbc6d7a3c30f99e2e504d5758d8e0ce140a8f444c4d944d85c3f29800bf8c5";
    let pipeline = "gcr.io/tekton-releases/github.com/tektoncd/pipeline/cmd";

    Fixture {
        description: "tekton",
        images: ImageList::from(vec![
            record(
                manifest,
                digest,
                CONTAINERS,
                &format!("{pipeline}/controller:v0.40.2@{TEKTON_CONTROLLER_DIGEST}"),
            ),
            record(
                manifest,
                digest,
                CONTAINERS,
                &format!("{pipeline}/webhook:v0.40.2@{TEKTON_WEBHOOK_DIGEST}"),
            ),
        ]),
    }
}

pub fn all() -> Vec<Fixture> {
    vec![basic(), contour(), flux(), tekton()]
}

/// Digests resolved from the registries for the tag-only references
pub const RESOLVED_DIGESTS: &[(&str, &str)] = &[
    (
        "ghcr.io/projectcontour/contour:v1.24.1",
        "sha256:6c87d0bc19fcec5219107d4e153ea019febd8e03c505276383f4ee1df1d592d6",
    ),
    (
        "docker.io/envoyproxy/envoy:v1.25.1",
        "sha256:d988076dfe0c92d6c7b8dac20e6b278c8de6c2f374f0f2b90976b7886f9a2852",
    ),
    (
        "ghcr.io/fluxcd/kustomize-controller:v0.30.0",
        "sha256:8c6952141b93764740c94aac02b21cc0630902176bdf07ab6b76970e3556a0d2",
    ),
    (
        "ghcr.io/fluxcd/source-controller:v0.31.0",
        "sha256:1e0b062d5129a462250eb03c5e8bd09b4cc42e88b25e39e35eee81d7ed2d15c0",
    ),
];

pub fn resolved_digest(reference: &str) -> Option<&'static str> {
    RESOLVED_DIGESTS
        .iter()
        .find(|(r, _)| *r == reference)
        .map(|(_, digest)| *digest)
}

/// The contour and flux fixtures with every record pinned to its resolved
/// digest; tekton already carries digests in its references.
pub fn with_digests() -> Vec<Fixture> {
    let mut fixtures = vec![contour(), flux(), tekton()];
    for fixture in &mut fixtures {
        for record in fixture.images.items_mut() {
            if record.digest.is_none() {
                let digest = resolved_digest(&record.original_ref)
                    .unwrap_or_else(|| panic!("no resolved digest for {}", record.original_ref));
                record.digest = Some(digest.to_string());
            }
        }
    }
    fixtures
}

/// One call made through [`FakeTransfer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub source_ref: String,
    pub destination_ref: String,
    pub digest: Option<String>,
}

/// Records every copy and fails the call with the given 1-based number
#[derive(Default)]
pub struct FakeTransfer {
    fail_on: Option<usize>,
    calls: Mutex<Vec<Call>>,
}

impl FakeTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageTransfer for FakeTransfer {
    async fn copy(
        &self,
        source_ref: &str,
        destination_ref: &str,
        digest: Option<&str>,
    ) -> Result<(), RegistryError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(Call {
            source_ref: source_ref.to_string(),
            destination_ref: destination_ref.to_string(),
            digest: digest.map(str::to_string),
        });
        if self.fail_on == Some(calls.len()) {
            return Err(RegistryError::Network(format!("connection reset copying {source_ref}")));
        }
        Ok(())
    }
}
