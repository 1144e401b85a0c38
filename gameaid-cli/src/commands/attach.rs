use std::path::PathBuf;

use crate::error::AppError;
use crate::models::storage::Store;
use crate::util::read_data_uri;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "attach-photo", about = "Set the profile photo of a user")]
pub struct AttachPhoto {
    #[clap(help = "Email of the user")]
    email: String,
    #[clap(value_parser, help = "Image file")]
    path: PathBuf,
}

impl AttachPhoto {
    pub fn run(&self, store: &mut Store) -> Result<(), AppError> {
        let uri = read_data_uri(&self.path, "image")?;
        store.attach_profile_photo(&self.email, uri)?;

        println!("Profile photo saved for {}", self.email);
        Ok(())
    }
}

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "attach-voice", about = "Set the voice message of a user")]
pub struct AttachVoice {
    #[clap(help = "Email of the user")]
    email: String,
    #[clap(value_parser, help = "Audio file")]
    path: PathBuf,
}

impl AttachVoice {
    pub fn run(&self, store: &mut Store) -> Result<(), AppError> {
        let uri = read_data_uri(&self.path, "audio")?;
        store.attach_voice_message(&self.email, uri)?;

        println!("Voice message saved for {}", self.email);
        Ok(())
    }
}
