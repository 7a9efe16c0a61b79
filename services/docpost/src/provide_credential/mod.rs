mod certificate;
pub use certificate::CertificateCredentialProvider;

mod static_provider;
pub use static_provider::StaticCredentialProvider;
