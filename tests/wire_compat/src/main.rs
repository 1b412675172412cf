fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use tgbucket_protocol::{
        CallRoute, GetFile, InputFileLocation, RemoteFileHandle, RpcError, SaveBigFilePart,
        UploadFile,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture, re-serializes it, and compares the JSON values.
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  rust:    {reserialized}"
        );
        parsed
    }

    #[test]
    fn fixture_save_big_file_part() {
        let part: SaveBigFilePart = roundtrip_test("save_big_file_part.json");
        assert_eq!(part.file_part, 2);
        assert_eq!(part.file_total_parts, 3);
        assert_eq!(part.bytes, b"hello");
    }

    #[test]
    fn fixture_get_file() {
        let req: GetFile = roundtrip_test("get_file.json");
        assert_eq!(req.offset, 1024 * 1024);
        assert_eq!(req.limit, 512 * 1024);
        let InputFileLocation::Document {
            file_reference, ..
        } = req.location;
        assert_eq!(file_reference, vec![1, 2, 3, 4]);
    }

    #[test]
    fn fixture_upload_file() {
        let file: UploadFile = roundtrip_test("upload_file.json");
        assert_eq!(file.bytes, b"abc");
        assert_eq!(file.mtime, 1_700_000_000);
    }

    #[test]
    fn fixture_input_file_big() {
        let handle: RemoteFileHandle = roundtrip_test("input_file_big.json");
        assert_eq!(handle.id, 1_700_000_000_123);
        assert_eq!(handle.total_parts, 3);
    }

    #[test]
    fn fixture_call_route() {
        let route: CallRoute = roundtrip_test("call_route.json");
        assert_eq!(route.dc_id, Some(4));
    }

    #[test]
    fn fixture_rpc_error() {
        let err: RpcError = roundtrip_test("rpc_error.json");
        assert_eq!(err.flood_wait(), Some(std::time::Duration::from_secs(5)));
    }

    #[test]
    fn default_route_serializes_empty() {
        let json = serde_json::to_value(CallRoute::default_dc()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
