fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Envoy callout protos: ext_authz (Check) and ext_proc (Process).
    // Trimmed copies of the upstream definitions without validate/udpa imports.
    // Client stubs are kept for the end-to-end tests.
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(
            &[
                "proto/envoy/service/auth/v3/external_auth.proto",
                "proto/envoy/service/ext_proc/v3/external_processor.proto",
            ],
            &["proto"],
        )?;

    Ok(())
}
