//! Exercise the HTTP tiers against a local stand-in server.

use std::{
    io::{BufRead, BufReader, Write},
    net::TcpListener,
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use smiles_lookup::{
    config::LookupConfig,
    pipeline::Pipeline,
    services::{http_client, Opsin, PubChemCompound, PubChemRest, Resolver},
    status::{Label, MatchKind, Service, Status},
};

struct TestServer {
    base: String,
    paths: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }

    fn config(&self) -> LookupConfig {
        LookupConfig {
            retries: 3,
            delay: Duration::ZERO,
            timeout: Duration::from_secs(5),
            pubchem_url: format!("{}/rest/pug", self.base),
            opsin_url: format!("{}/opsin", self.base),
            ..LookupConfig::default()
        }
    }
}

/// Serve every request with `route(path)`, one connection per request.
fn serve<F>(route: F) -> TestServer
where
    F: Fn(&str) -> (u16, String) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let paths = Arc::new(Mutex::new(Vec::new()));
    let seen = paths.clone();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let path = request_line
                .split_whitespace()
                .nth(1)
                .unwrap_or_default()
                .to_string();
            // Drain the headers.
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                    break;
                }
            }

            seen.lock().unwrap().push(path.clone());
            let (code, body) = route(&path);
            let reason = if code == 200 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {code} {reason}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });

    TestServer { base, paths }
}

fn not_found() -> (u16, String) {
    (404, "Status: 404\nCode: PUGREST.NotFound\n".to_string())
}

#[test]
fn rest_retries_until_success() {
    let counter = Arc::new(Mutex::new(0));
    let server = serve(move |_| {
        let mut n = counter.lock().unwrap();
        *n += 1;
        if *n == 1 {
            (503, "busy".to_string())
        } else {
            (200, "CCO\n".to_string())
        }
    });
    let config = server.config();
    let rest = PubChemRest::new(http_client(&config).unwrap(), &config);

    let hit = rest.resolve("ethanol", Label::OriginalName).unwrap();
    assert_eq!(hit.smiles, "CCO");
    assert_eq!(hit.status.to_string(), "method: PubChem REST (original name), attempt: 2");
    assert_eq!(
        server.paths(),
        vec![
            "/rest/pug/compound/name/ethanol/property/CanonicalSMILES/TXT",
            "/rest/pug/compound/name/ethanol/property/CanonicalSMILES/TXT",
        ]
    );
}

#[test]
fn rest_gives_up_after_retries() {
    let server = serve(|_| not_found());
    let config = server.config();
    let rest = PubChemRest::new(http_client(&config).unwrap(), &config);

    let status = rest.resolve("Benzoic Acid", Label::CleanedName).unwrap_err();
    assert_eq!(
        status.to_string(),
        "method: PubChem REST (cleaned name) (not found), attempts: 3"
    );
    let paths = server.paths();
    assert_eq!(paths.len(), 3);
    assert!(paths[0].contains("/name/Benzoic%20Acid/"));
}

#[test]
fn rest_retries_blank_body() {
    let counter = Arc::new(Mutex::new(0));
    let server = serve(move |_| {
        let mut n = counter.lock().unwrap();
        *n += 1;
        if *n == 1 {
            (200, "  \n".to_string())
        } else {
            (200, "CCO\n".to_string())
        }
    });
    let config = server.config();
    let rest = PubChemRest::new(http_client(&config).unwrap(), &config);

    let hit = rest.resolve("ethanol", Label::OriginalName).unwrap();
    assert_eq!(hit.smiles, "CCO");
    assert_eq!(hit.status.to_string(), "method: PubChem REST (original name), attempt: 2");
    assert_eq!(server.paths().len(), 2);
}

#[test]
fn rest_connection_refused_is_a_miss() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let config = LookupConfig {
        retries: 3,
        delay: Duration::ZERO,
        timeout: Duration::from_secs(5),
        pubchem_url: format!("http://{addr}/rest/pug"),
        ..LookupConfig::default()
    };
    let rest = PubChemRest::new(http_client(&config).unwrap(), &config);

    let status = rest.resolve("ethanol", Label::OriginalName).unwrap_err();
    assert_eq!(status, Status::missed(Service::PubChemRest, Label::OriginalName, 3));
}

#[test]
fn rest_does_not_pause_after_last_attempt() {
    let server = serve(|_| not_found());
    let config = LookupConfig {
        retries: 2,
        delay: Duration::from_secs(1),
        ..server.config()
    };
    let rest = PubChemRest::new(http_client(&config).unwrap(), &config);

    let start = Instant::now();
    let status = rest.resolve("nonsense", Label::Variant).unwrap_err();
    let elapsed = start.elapsed();

    assert_eq!(status, Status::missed(Service::PubChemRest, Label::Variant, 2));
    assert_eq!(server.paths().len(), 2);
    // One pause between the two attempts, none after the second.
    assert!(elapsed >= Duration::from_secs(1), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(1900), "{elapsed:?}");
}

#[test]
fn rest_uses_first_of_several_records() {
    let server = serve(|_| (200, "C(=O)O\nC(=O)[O-]\n".to_string()));
    let config = server.config();
    let rest = PubChemRest::new(http_client(&config).unwrap(), &config);

    let hit = rest.resolve("formic acid", Label::Variant).unwrap();
    assert_eq!(hit.smiles, "C(=O)O");
}

#[test]
fn compound_reports_synonym_match() {
    let server = serve(|path| {
        if path.ends_with("/property/CanonicalSMILES/JSON") {
            (
                200,
                r#"{"PropertyTable":{"Properties":[{"CID":243,"CanonicalSMILES":"C1=CC=C(C=C1)C(=O)O"}]}}"#.to_string(),
            )
        } else if path == "/rest/pug/compound/cid/243/synonyms/JSON" {
            (
                200,
                r#"{"InformationList":{"Information":[{"CID":243,"Synonym":["benzoic acid","Benzenecarboxylic acid"]}]}}"#.to_string(),
            )
        } else {
            not_found()
        }
    });
    let config = server.config();
    let compound = PubChemCompound::new(http_client(&config).unwrap(), &config);

    let hit = compound.resolve("Benzoic Acid", Label::CleanedName).unwrap();
    assert_eq!(hit.smiles, "C1=CC=C(C=C1)C(=O)O");
    assert_eq!(hit.matched_name, "benzoic acid");
    assert_eq!(
        hit.status,
        Status::Found {
            service: Service::PubChemCompound,
            kind: Some(MatchKind::Synonym),
            label: Label::CleanedName,
            attempt: 1,
        }
    );
    assert_eq!(
        hit.status.to_string(),
        "method: PubChem compound synonym (cleaned name), attempt: 1"
    );
}

#[test]
fn compound_without_synonyms_is_exact() {
    let server = serve(|path| {
        if path.ends_with("/JSON") && path.contains("/name/") {
            (
                200,
                r#"{"PropertyTable":{"Properties":[{"CID":702,"ConnectivitySMILES":"CCO"}]}}"#.to_string(),
            )
        } else {
            not_found()
        }
    });
    let config = server.config();
    let compound = PubChemCompound::new(http_client(&config).unwrap(), &config);

    let hit = compound.resolve("ethanol", Label::OriginalName).unwrap();
    assert_eq!(hit.matched_name, "ethanol");
    assert_eq!(
        hit.status.to_string(),
        "method: PubChem compound exact (original name), attempt: 1"
    );
}

#[test]
fn compound_miss_is_single_attempt() {
    let server = serve(|_| not_found());
    let config = server.config();
    let compound = PubChemCompound::new(http_client(&config).unwrap(), &config);

    let status = compound.resolve("nonsense", Label::Variant).unwrap_err();
    assert_eq!(status.to_string(), "method: PubChem compound (variant) (not found)");
    assert_eq!(server.paths().len(), 1);
}

#[test]
fn opsin_parses_smi() {
    let server = serve(|path| match path {
        "/opsin/ethanol.smi" => (200, "CCO\n".to_string()),
        "/opsin/blank.smi" => (200, "  \n".to_string()),
        _ => not_found(),
    });
    let config = server.config();
    let opsin = Opsin::new(http_client(&config).unwrap(), &config);

    let hit = opsin.resolve("ethanol", Label::Variant).unwrap();
    assert_eq!(hit.smiles, "CCO");
    assert_eq!(hit.status.to_string(), "method: OPSIN (variant), attempt: 1");

    let status = opsin.resolve("blank", Label::CleanedName).unwrap_err();
    assert_eq!(status.to_string(), "method: OPSIN (cleaned name) (not found)");
}

#[test]
fn pipeline_falls_through_to_opsin() {
    let server = serve(|path| match path {
        "/opsin/2,4,6%20Trinitrotoluene.smi" => {
            (200, "CC1=C(C=C(C=C1[N+](=O)[O-])[N+](=O)[O-])[N+](=O)[O-]".to_string())
        }
        _ => not_found(),
    });
    let config = LookupConfig {
        retries: 1,
        ..server.config()
    };
    let pipeline = Pipeline::from_config(&config).unwrap();

    let res = pipeline.fetch_best_smiles("2,4,6-trinitrotoluene");
    assert!(res.is_resolved());
    assert_eq!(res.status.to_string(), "method: OPSIN (cleaned name), attempt: 1");
    assert_eq!(res.matched_name, "2,4,6 Trinitrotoluene");

    let paths = server.paths();
    assert_eq!(paths.len(), 6);
    assert!(paths[..4].iter().all(|p| p.starts_with("/rest/pug/")));
    assert_eq!(paths[4], "/opsin/2,4,6-trinitrotoluene.smi");
}
