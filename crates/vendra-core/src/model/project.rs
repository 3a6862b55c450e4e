// ── Bookings and what gets sold with them ──

use serde_json::{Map, Value};

entity! {
    /// A booked job: the hub most other records point at.
    #[allow(clippy::struct_excessive_bools)]
    pub struct Project in projects as Projects {
        pub project_name: String,
        pub client_name: String,
        pub client_id: String,
        pub project_type: String,
        pub package_name: String,
        pub package_id: String,
        pub add_ons: Vec<Value>,
        pub date: String,
        pub deadline_date: String,
        pub location: String,
        pub progress: f64,
        pub status: String,
        pub active_sub_statuses: Vec<String>,
        pub total_cost: f64,
        pub amount_paid: f64,
        pub payment_status: String,
        pub team: Vec<Value>,
        pub notes: String,
        pub accommodation: String,
        pub drive_link: String,
        pub client_drive_link: String,
        pub final_drive_link: String,
        pub start_time: String,
        pub end_time: String,
        pub image: String,
        pub revisions: Vec<Value>,
        pub promo_code_id: String,
        pub discount_amount: f64,
        pub shipping_details: String,
        pub dp_proof_url: String,
        pub printing_details: Vec<Value>,
        pub printing_cost: f64,
        pub transport_cost: f64,
        pub is_editing_confirmed_by_client: bool,
        pub is_printing_confirmed_by_client: bool,
        pub is_delivery_confirmed_by_client: bool,
        pub confirmed_sub_statuses: Vec<String>,
        pub client_sub_status_notes: Map<String, Value>,
        pub sub_status_confirmation_sent_at: Map<String, Value>,
        pub completed_digital_items: Vec<String>,
        pub invoice_signature: String,
    }
    draft ProjectDraft;
    patch ProjectPatch;
}

entity! {
    /// A priced service bundle.
    pub struct Package in packages as Packages {
        pub name: String,
        pub price: f64,
        pub physical_items: Vec<Value>,
        pub digital_items: Vec<String>,
        pub processing_time: String,
        pub photographers: String,
        pub videographers: String,
    }
    draft PackageDraft;
    patch PackagePatch;
}

entity! {
    pub struct AddOn in add_ons as AddOns {
        pub name: String,
        pub price: f64,
    }
    draft AddOnDraft;
    patch AddOnPatch;
}

entity! {
    /// Signed service agreement for a project.
    pub struct Contract in contracts as Contracts {
        pub contract_number: String,
        pub client_id: String,
        pub project_id: String,
        pub signing_date: String,
        pub signing_location: String,
        pub client_name1: String,
        pub client_address1: String,
        pub client_phone1: String,
        pub client_name2: String,
        pub client_address2: String,
        pub client_phone2: String,
        pub shooting_duration: String,
        pub guaranteed_photos: String,
        pub album_details: String,
        pub digital_files_format: String,
        pub other_items: String,
        pub personnel_count: String,
        pub delivery_timeframe: String,
        pub dp_date: String,
        pub final_payment_date: String,
        pub cancellation_policy: String,
        pub jurisdiction: String,
        pub vendor_signature: String,
        pub client_signature: String,
    }
    server {
        pub created_at: String,
    }
    draft ContractDraft;
    patch ContractPatch;
}

entity! {
    pub struct ClientFeedback in client_feedback as ClientFeedback {
        pub client_name: String,
        pub satisfaction: String,
        pub rating: f64,
        pub feedback: String,
        pub date: String,
    }
    draft ClientFeedbackDraft;
    patch ClientFeedbackPatch;
}

entity! {
    /// Planned social post showcasing a project.
    pub struct SocialMediaPost in social_media_posts as SocialMediaPosts {
        pub project_id: String,
        pub client_name: String,
        pub post_type: String,
        pub platform: String,
        pub scheduled_date: String,
        pub caption: String,
        pub media_url: String,
        pub status: String,
        pub notes: String,
    }
    draft SocialMediaPostDraft;
    patch SocialMediaPostPatch;
}
