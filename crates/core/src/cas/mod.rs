//! CAS module - statement upload, password vault, parsing and status tracking.

mod cas_model;
mod cas_service;
mod cas_state_machine;
mod cas_traits;
mod credential_vault;
mod file_stager;
mod parser_gateway;
mod record_merger;


pub use cas_model::{
    CasDataView, CasFile, CasFileMeta, CasFormat, CasRecord, CasStatus, CasStatusView, CasUpload,
    DematAccount, DematHolding, EncryptedSecret, InvestorInfo, MutualFundHolding,
    PortfolioSnapshot, SnapshotSummary,
};
pub use cas_service::{CasService, ParseTicket};
pub use cas_traits::CasServiceTrait;
pub use credential_vault::CredentialVault;
pub use file_stager::{sanitize_file_name, validate_cas_upload, FileStager, StagedFile};
pub use parser_gateway::{
    classify_failure, CommandParserGateway, ParserGatewayTrait, EXIT_CORRUPT_FILE,
    EXIT_UNSUPPORTED_FORMAT, EXIT_WRONG_PASSWORD,
};
pub use record_merger::RecordMerger;
