use std::path::PathBuf;

use clap::{Args, ValueEnum};
use coursework_sync::CourseLinkStyle;
use secrecy::SecretString;
use url::Url;

#[derive(Args)]
pub struct ConfigArgs {
    /// LMS API base, e.g. https://school.instructure.com
    #[clap(long, env = "LMS_BASE_URL", value_parser)]
    pub lms_base_url: Url,

    #[clap(long, env = "LMS_ACCESS_TOKEN", value_parser, hide_env_values = true)]
    pub lms_access_token: String,

    #[clap(long, env = "LMS_USER_ID", value_parser)]
    pub lms_user_id: Option<String>,

    #[clap(long, env = "DOCS_API_TOKEN", value_parser, hide_env_values = true)]
    pub docs_api_token: String,

    /// Destination collection holding one document per course.
    #[clap(long, env = "DOCS_COURSE_COLLECTION", value_parser)]
    pub course_collection_id: String,

    /// Destination collection holding one document per assignment.
    #[clap(long, env = "DOCS_ASSIGNMENT_COLLECTION", value_parser)]
    pub assignment_collection_id: String,

    /// How assignment documents reference their course.
    #[clap(
        long,
        env = "DOCS_COURSE_LINK_STYLE",
        value_enum,
        default_value = "relation"
    )]
    pub course_link_style: LinkStyleArg,

    #[clap(
        long,
        env = "SYNC_STATE_PATH",
        value_parser,
        default_value = "sync-state.json"
    )]
    pub state_path: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LinkStyleArg {
    Relation,
    Select,
}

pub struct Config {
    pub lms_base_url: Url,
    pub lms_access_token: SecretString,
    pub lms_user_id: Option<String>,
    pub docs_api_token: SecretString,
    pub course_collection_id: String,
    pub assignment_collection_id: String,
    pub link_style: CourseLinkStyle,
    pub state_path: PathBuf,
}

impl From<ConfigArgs> for Config {
    fn from(args: ConfigArgs) -> Self {
        let link_style = match args.course_link_style {
            LinkStyleArg::Relation => CourseLinkStyle::Relation,
            LinkStyleArg::Select => CourseLinkStyle::SelectName,
        };

        Self {
            lms_base_url: args.lms_base_url,
            lms_access_token: SecretString::new(args.lms_access_token),
            lms_user_id: args.lms_user_id,
            docs_api_token: SecretString::new(args.docs_api_token),
            course_collection_id: args.course_collection_id,
            assignment_collection_id: args.assignment_collection_id,
            link_style,
            state_path: args.state_path,
        }
    }
}
