//! Materials API client methods

use super::StudyTailorClient;
use crate::error::ClientError;
use crate::types::{AllMaterialsResponse, MaterialContent, MaterialUpload};
use reqwest::multipart::{Form, Part};
use studytailor_core::Material;

impl StudyTailorClient {
    /// List the materials attached to a subject
    pub async fn materials(&self, subject_id: i64) -> Result<Vec<Material>, ClientError> {
        let request = self.request(
            reqwest::Method::GET,
            &format!("/subjects/{subject_id}/materials/"),
        );
        self.execute(request).await
    }

    /// Attach a new material to a subject
    ///
    /// Multipart bodies cannot be cloned for replay, so both the first
    /// attempt and the potential replay are built from the upload here.
    pub async fn upload_material(
        &self,
        subject_id: i64,
        upload: &MaterialUpload,
    ) -> Result<(), ClientError> {
        let path = format!("/subjects/{subject_id}/materials/");
        let first = self
            .request(reqwest::Method::POST, &path)
            .multipart(upload_form(upload));
        let replay = self
            .request(reqwest::Method::POST, &path)
            .multipart(upload_form(upload));

        self.send_with_replay(first, Some(replay)).await?;
        Ok(())
    }

    /// Delete a material
    pub async fn delete_material(
        &self,
        subject_id: i64,
        material_id: i64,
    ) -> Result<(), ClientError> {
        let request = self.request(
            reqwest::Method::DELETE,
            &format!("/subjects/{subject_id}/materials/{material_id}/"),
        );
        self.execute_empty(request).await
    }

    /// Download a material's file content
    pub async fn download_material(
        &self,
        subject_id: i64,
        material_id: i64,
    ) -> Result<bytes::Bytes, ClientError> {
        let request = self.request(
            reqwest::Method::GET,
            &format!("/subjects/{subject_id}/materials/{material_id}/download/"),
        );
        self.execute_raw(request).await
    }

    /// List every material of the user together with aggregate statistics
    pub async fn all_materials(&self) -> Result<AllMaterialsResponse, ClientError> {
        let request = self.request(reqwest::Method::GET, "/materials/get_all_materials/");
        self.execute(request).await
    }
}

fn upload_form(upload: &MaterialUpload) -> Form {
    let mut form = Form::new()
        .text("title", upload.title.clone())
        .text(
            "description",
            upload.description.clone().unwrap_or_default(),
        );

    match &upload.content {
        MaterialContent::File { filename, bytes } => {
            form = form.part(
                "file",
                Part::bytes(bytes.clone()).file_name(filename.clone()),
            );
        }
        MaterialContent::Link(link) => {
            form = form.text("link", link.clone());
        }
    }

    form
}
