//! Submission payloads handed to the record store.
//!
//! Each request exposes its multipart layout as plain `(name, value)` text fields plus
//! `(name, file)` parts so the transport stays a thin adapter.

use super::asset::PhotoFile;

/// New portrait for one occupant inside a combined create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupantPhoto {
    /// Position of the occupant in the document's occupant list.
    pub index: usize,
    pub occupant_name: String,
    pub gender: String,
    pub uploader_name: String,
    pub photo: PhotoFile,
}

/// `POST /upload-photos`: every occupant that has no stored portrait yet, in one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePhotosRequest {
    pub document_no: String,
    pub occupants: Vec<OccupantPhoto>,
}

impl CreatePhotosRequest {
    pub fn text_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![("document_no".to_string(), self.document_no.clone())];
        for o in &self.occupants {
            let i = o.index;
            fields.push((format!("occupants[{i}][occupant_name]"), o.occupant_name.clone()));
            fields.push((format!("occupants[{i}][gender]"), o.gender.clone()));
            fields.push((format!("occupants[{i}][uploader_name]"), o.uploader_name.clone()));
        }
        fields
    }

    pub fn file_fields(&self) -> Vec<(String, &PhotoFile)> {
        self.occupants
            .iter()
            .map(|o| (format!("occupants[{}][photo]", o.index), &o.photo))
            .collect()
    }
}

/// `POST /upload-photos/{id}`: replace one stored portrait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePhotoRequest {
    pub photo: PhotoFile,
    pub uploader_name: String,
}

/// `POST /slideshow`: one batch of gallery photos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideshowBatchRequest {
    pub document_no: String,
    pub uploader_name: String,
    pub email_add: Option<String>,
    pub photos: Vec<PhotoFile>,
}

impl SlideshowBatchRequest {
    pub fn text_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("document_no".to_string(), self.document_no.clone()),
            ("uploader_name".to_string(), self.uploader_name.clone()),
        ];
        if let Some(email) = &self.email_add {
            fields.push(("email_add".to_string(), email.clone()));
        }
        fields
    }
}

/// `POST /review`: family feedback with optional screenshots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReviewRequest {
    pub document_no: String,
    pub reviewer_name: String,
    pub contact_number: String,
    pub selected_public_question: String,
    pub selected_private_question: String,
    pub public_others: Vec<String>,
    pub private_faq_answer: String,
    pub private_others: String,
    pub fb_screenshot: Option<PhotoFile>,
    pub google_screenshot: Option<PhotoFile>,
}

impl ReviewRequest {
    pub fn text_fields(&self) -> Vec<(String, String)> {
        vec![
            ("document_no".to_string(), self.document_no.clone()),
            ("reviewer_name".to_string(), self.reviewer_name.clone()),
            ("contact_number".to_string(), self.contact_number.clone()),
            (
                "selected_public_question".to_string(),
                self.selected_public_question.clone(),
            ),
            (
                "selected_private_question".to_string(),
                self.selected_private_question.clone(),
            ),
            ("public_others".to_string(), self.public_others.join("; ")),
            ("private_faq_answer".to_string(), self.private_faq_answer.clone()),
            ("privateOthers".to_string(), self.private_others.clone()),
        ]
    }

    pub fn file_fields(&self) -> Vec<(String, &PhotoFile)> {
        let mut files = Vec::new();
        if let Some(f) = &self.fb_screenshot {
            files.push(("fb_screenshot".to_string(), f));
        }
        if let Some(f) = &self.google_screenshot {
            files.push(("google_screenshot".to_string(), f));
        }
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_fields_keep_occupant_index() {
        let req = CreatePhotosRequest {
            document_no: "12345".to_string(),
            occupants: vec![OccupantPhoto {
                index: 2,
                occupant_name: "Juan Dela Cruz".to_string(),
                gender: "male".to_string(),
                uploader_name: "Ana".to_string(),
                photo: PhotoFile::new("cropped.png", "image/png", vec![1u8]),
            }],
        };

        let fields = req.text_fields();
        assert_eq!(fields[0], ("document_no".to_string(), "12345".to_string()));
        assert!(fields.contains(&(
            "occupants[2][occupant_name]".to_string(),
            "Juan Dela Cruz".to_string()
        )));
        assert_eq!(req.file_fields()[0].0, "occupants[2][photo]");
    }

    #[test]
    fn test_slideshow_fields_skip_missing_email() {
        let req = SlideshowBatchRequest {
            document_no: "67890".to_string(),
            uploader_name: "Ana".to_string(),
            email_add: None,
            photos: vec![],
        };
        assert_eq!(req.text_fields().len(), 2);
    }
}
