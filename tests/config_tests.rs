mod common;

use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::{SecureHierarchy, TestZone};
use dnssec_chain::chain_file::{ChainFile, parse_timestamp};
use dnssec_chain::dnssec::{DnsSecError, DnsSecValidator, Dnskey, Ds, Rrsig, ValidationResult};
use dnssec_chain::{ConfigError, ValidatorConfig};

const ROOT_KSK: &str = "AwEAAaz/tAm8yTn4Mfeh5eyI96WSVexTBAvkMgJzkKTOiW1vkIbzxeF3+/4RgWOq7HrxRixHlFlExOLAJr5emLvN7SWXgnLh4+B5xQlNVz8Og8kvArMtNROxVQuCaSnIDdD5LKyWbRd2n9WGe2R8PzgCmr3EgVLrjyBxWezF0jLHwVN8efS3rCj/EWgvIWgb9tarpVUDK/b58Da+sqqls3eNbuv7pr+eoZG+SrDK6nWeL3c6H5Apxz7LjVc1uTIdsIXxuOLYA4/ilBmSVIzuDWfdRUfhHdY6+cn8HFRm+2hM8AnXGXws9555KrUB5qihylGa8subX2Nn6UwNR1AkUTV74bU=";
const ROOT_ZSK: &str = "AwEAAeVDC34GZILwsQJy97K2Fst4P3XYZrXLyrkausYzSqEjSUulgh+iLgHg0y7FIF890+sIjXsk7KLJUmCOWfYWPorNKEOKLk5Zx/4M6D3IHZE3O3m/Eahrc28qQzmTLxiMZAW65MvR2UO3LxVtYOPBEBiDgAQD47x2JLsJYtavCzNL5WiUk59OgvHmDqmcC7VXYBhK8V8Tic089XJgExGeplKWUt9yyc31ra1swJX51XsOaQz17+vyLVH8AZP26KvKFiZeoRbaq6vl+hc8HQnI2ug5rA2zoz3MsSQBvP1f/HvqsWxLqwXXKyDD1QM639U+XzVB8CYigyscRP22QCnwKIU=";
const ROOT_SIG: &str = "otBkINZAQu7AvPKjr/xWIEE7+SoZtKgF8bzVynX6bfJMJuPay8jPvNmwXkZOdSoYlvFp0bk9JWJKCh8y5uoNfMFkN6OSrDkr3t0E+c8c0Mnmwkk5CETH3Gqxthi0yyRX5T4VlHU06/Ks4zI+XAgl3FBpOc554ivdzez8YCjAIGx7XgzzooEb7heMSlLc7S7/HNjw51TPRs4RxrAVcezieKCzPPpeWBhjE6R3oiSwrl0SBD4/yplrDlr7UHs/Atcm3MSgemdyr2sOoOUkVQCVpcj3SQQezoD2tCM7861CXEQdg5fjeHDtz285xHt5HJpA5cOcctRo4ihybfow/+V7AQ==";

fn root_chain_toml() -> String {
    format!(
        r#"
[[zone]]
name = "."
delegation = "anchor"
ttl = 172800
dnskey = [
    {{ flags = 257, algorithm = 8, public_key = "{ROOT_KSK}" }},
    {{ flags = 256, algorithm = 8, public_key = "{ROOT_ZSK}" }},
]

[[zone.dnskey_rrsig]]
algorithm = 8
labels = 0
original_ttl = 172800
expiration = "20190611000000"
inception = "20190521000000"
key_tag = 20326
signer = "."
signature = "{ROOT_SIG}"
"#
    )
}

fn b64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

fn dnskey_toml(key: &Dnskey) -> String {
    format!(
        "{{ flags = {}, algorithm = {}, public_key = \"{}\" }}",
        key.flags(),
        key.algorithm(),
        b64(key.public_key())
    )
}

fn ds_toml(ds: &Ds) -> String {
    format!(
        "{{ key_tag = {}, algorithm = {}, digest_type = {}, digest = \"{}\" }}",
        ds.key_tag(),
        ds.algorithm(),
        ds.digest_type(),
        hex::encode_upper(ds.digest())
    )
}

fn rrsig_toml(table: &str, rrsig: &Rrsig) -> String {
    format!(
        "[[zone.{table}]]\nalgorithm = {}\nexpiration = {}\ninception = {}\nkey_tag = {}\nsigner = \"{}\"\nsignature = \"{}\"\n",
        rrsig.algorithm(),
        rrsig.expiration(),
        rrsig.inception(),
        rrsig.key_tag(),
        rrsig.signer_name(),
        b64(rrsig.signature())
    )
}

/// Describe a signed zone the way a chain file does
fn zone_toml(zone: &TestZone, delegation: &str, parent: Option<&TestZone>) -> String {
    let dnskey = zone.signed_dnskey_set();
    let mut out = format!(
        "[[zone]]\nname = \"{}\"\ndelegation = \"{}\"\nttl = 3600\ndnskey = [{}, {}]\n",
        zone.name,
        delegation,
        dnskey_toml(&zone.ksk.dnskey),
        dnskey_toml(&zone.zsk.dnskey)
    );
    if let Some(parent) = parent {
        out.push_str(&format!("ds_ttl = 86400\nds = [{}]\n", ds_toml(&zone.ds())));
        let dnssec_chain::dnssec::Delegation::Signed(ds_set) = parent.delegate(zone) else {
            unreachable!()
        };
        for rrsig in ds_set.signatures() {
            out.push_str(&rrsig_toml("ds_rrsig", rrsig));
        }
    }
    for rrsig in dnskey.signatures() {
        out.push_str(&rrsig_toml("dnskey_rrsig", rrsig));
    }
    out
}

#[test]
fn test_real_root_chain_with_builtin_anchors() {
    let chain = ChainFile::from_toml_str(&root_chain_toml())
        .unwrap()
        .build(16)
        .unwrap();
    let anchors = ValidatorConfig::default().trust_anchor_store().unwrap();

    let at = parse_timestamp("2019-05-29T12:00:00Z").unwrap();
    let verdicts = chain.evaluate(&DnsSecValidator::new().at_time(at), &anchors);
    assert_eq!(verdicts, vec![ValidationResult::Secure]);

    let too_late = parse_timestamp("2019-06-12T00:00:00Z").unwrap();
    let verdicts = chain.evaluate(&DnsSecValidator::new().at_time(too_late), &anchors);
    assert!(matches!(
        verdicts[0],
        ValidationResult::Bogus(DnsSecError::ValidityPeriodExpired { .. })
    ));
}

#[test]
fn test_real_root_chain_without_builtin_anchors() {
    let chain = ChainFile::from_toml_str(&root_chain_toml())
        .unwrap()
        .build(16)
        .unwrap();
    let config = ValidatorConfig::from_toml_str("use_builtin_root_anchors = false").unwrap();
    let anchors = config.trust_anchor_store().unwrap();

    let at = parse_timestamp("20190529120000").unwrap();
    assert_eq!(
        chain.evaluate(&DnsSecValidator::new().at_time(at), &anchors),
        vec![ValidationResult::Bogus(DnsSecError::NoTrustAnchor(
            dnssec_chain::dnssec::Name::root()
        ))]
    );
}

#[test]
fn test_root_declared_insecure_stays_bogus() {
    let toml = "[[zone]]\nname = \".\"\ndelegation = \"insecure\"\n\n[[zone]]\nname = \"com.\"\ndelegation = \"insecure\"\n";
    let chain = ChainFile::from_toml_str(toml).unwrap().build(16).unwrap();
    let anchors = ValidatorConfig::default().trust_anchor_store().unwrap();

    assert_eq!(
        chain.evaluate(&DnsSecValidator::new(), &anchors),
        vec![
            ValidationResult::Bogus(DnsSecError::AnchoredZoneUnsigned(
                dnssec_chain::dnssec::Name::root()
            )),
            ValidationResult::Bogus(DnsSecError::UntrustedParent(
                dnssec_chain::dnssec::Name::root()
            )),
        ]
    );
}

#[test]
fn test_signed_chain_file_round_trip() {
    let zones = SecureHierarchy::new();
    let toml = [
        zone_toml(&zones.root, "anchor", None),
        zone_toml(&zones.com, "signed", Some(&zones.root)),
        zone_toml(&zones.example, "signed", Some(&zones.com)),
    ]
    .join("\n");

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(toml.as_bytes()).unwrap();

    let chain = ChainFile::from_file(file.path()).unwrap().build(16).unwrap();
    assert_eq!(chain.len(), 3);
    assert_eq!(
        chain.evaluate(&common::validator(), &zones.anchors()),
        vec![ValidationResult::Secure; 3]
    );
}

#[test]
fn test_config_file_with_inline_anchor() {
    let zone = TestZone::new("example.");
    let ds = zone.ds();
    let config_toml = format!(
        "use_builtin_root_anchors = false\nmax_chain_depth = 4\n\n[[trust_anchors]]\ntype = \"ds\"\nzone = \"example.\"\nkey_tag = {}\nalgorithm = 15\ndigest_type = 2\ndigest = \"{}\"\n",
        ds.key_tag(),
        hex::encode_upper(ds.digest())
    );
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(config_toml.as_bytes()).unwrap();

    let config = ValidatorConfig::from_file(file.path()).unwrap();
    assert_eq!(config.max_chain_depth, 4);

    let chain = ChainFile::from_toml_str(&zone_toml(&zone, "anchor", None))
        .unwrap()
        .build(config.max_chain_depth)
        .unwrap();
    let anchors = config.trust_anchor_store().unwrap();
    assert_eq!(
        chain.evaluate(&common::validator(), &anchors),
        vec![ValidationResult::Secure]
    );
}

#[test]
fn test_chain_file_depth_limit() {
    let toml = "[[zone]]\nname = \".\"\ndelegation = \"anchor\"\n\n[[zone]]\nname = \"com.\"\ndelegation = \"insecure\"\n\n[[zone]]\nname = \"example.com.\"\ndelegation = \"insecure\"\n";
    let file = ChainFile::from_toml_str(toml).unwrap();
    assert!(file.build(3).is_ok());
    assert_eq!(
        file.build(2).unwrap_err(),
        ConfigError::Chain(DnsSecError::ChainTooDeep(2))
    );
}

#[test]
fn test_missing_files() {
    assert!(matches!(
        ValidatorConfig::from_file("/nonexistent/dnssec-chain.toml"),
        Err(ConfigError::Io { .. })
    ));
    assert!(matches!(
        ChainFile::from_file("/nonexistent/chain.toml"),
        Err(ConfigError::Io { .. })
    ));
}

#[test]
fn test_config_from_env() {
    // Environment variables are process-wide; every case runs in this one test
    unsafe {
        std::env::set_var("DNSSEC_CHAIN_MAX_DEPTH", "8");
        std::env::set_var("DNSSEC_CHAIN_BUILTIN_ROOT_ANCHORS", "off");
        std::env::set_var("DNSSEC_CHAIN_ANCHOR_FILE", "");
    }
    let config = ValidatorConfig::from_env().unwrap();
    assert_eq!(config.max_chain_depth, 8);
    assert!(!config.use_builtin_root_anchors);
    assert!(config.anchor_file.is_none());
    assert!(config.trust_anchor_store().unwrap().is_empty());

    unsafe {
        std::env::set_var("DNSSEC_CHAIN_MAX_DEPTH", "deep");
    }
    assert_eq!(
        ValidatorConfig::from_env().unwrap_err(),
        ConfigError::InvalidValue {
            var: "DNSSEC_CHAIN_MAX_DEPTH".to_string(),
            value: "deep".to_string(),
        }
    );

    unsafe {
        std::env::set_var("DNSSEC_CHAIN_MAX_DEPTH", "0");
    }
    assert!(matches!(
        ValidatorConfig::from_env(),
        Err(ConfigError::InvalidValue { .. })
    ));

    unsafe {
        std::env::remove_var("DNSSEC_CHAIN_MAX_DEPTH");
        std::env::remove_var("DNSSEC_CHAIN_BUILTIN_ROOT_ANCHORS");
        std::env::remove_var("DNSSEC_CHAIN_ANCHOR_FILE");
    }
    assert_eq!(ValidatorConfig::from_env().unwrap(), ValidatorConfig::default());
}
