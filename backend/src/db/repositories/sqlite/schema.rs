// Table names and column names follow the registry database layout
// (PascalCase identifiers); SQLite compares identifiers case-insensitively.
// Columns added by the additive migration carry defaults but no NOT NULL
// constraint, so they are nullable here.

diesel::table! {
    #[sql_name = "Regions"]
    regions (id) {
        #[sql_name = "Id"]
        id -> Integer,
        #[sql_name = "Name"]
        name -> Text,
    }
}

diesel::table! {
    #[sql_name = "Districts"]
    districts (id) {
        #[sql_name = "Id"]
        id -> Integer,
        #[sql_name = "Name"]
        name -> Text,
        #[sql_name = "RegionId"]
        region_id -> Integer,
    }
}

diesel::table! {
    #[sql_name = "Institutions"]
    institutions (id) {
        #[sql_name = "Id"]
        id -> Integer,
        #[sql_name = "Name"]
        name -> Text,
        #[sql_name = "Type"]
        institution_type -> Text,
        #[sql_name = "Address"]
        address -> Text,
        #[sql_name = "Contacts"]
        contacts -> Nullable<Text>,
        #[sql_name = "DistrictId"]
        district_id -> Integer,
        #[sql_name = "Status"]
        status -> Text,
        #[sql_name = "RegistrationDate"]
        registration_date -> Text,
        #[sql_name = "StudentCount"]
        student_count -> Integer,
        #[sql_name = "AdmittedCount"]
        admitted_count -> Integer,
        #[sql_name = "ExpelledCount"]
        expelled_count -> Integer,
        #[sql_name = "StaffCount"]
        staff_count -> Integer,
        #[sql_name = "LicenseNumber"]
        license_number -> Nullable<Text>,
        #[sql_name = "LicenseExpiryDate"]
        license_expiry_date -> Nullable<Text>,
        #[sql_name = "AccreditationCategory"]
        accreditation_category -> Nullable<Text>,
        #[sql_name = "OwnershipType"]
        ownership_type -> Nullable<Text>,
        #[sql_name = "LanguageOfEducation"]
        language_of_education -> Nullable<Text>,
        #[sql_name = "DirectorName"]
        director_name -> Nullable<Text>,
        #[sql_name = "Email"]
        email -> Nullable<Text>,
        #[sql_name = "Website"]
        website -> Nullable<Text>,
        #[sql_name = "FoundationYear"]
        foundation_year -> Nullable<Integer>,
        #[sql_name = "InstitutionStatus"]
        institution_status -> Nullable<Text>,
        #[sql_name = "ClassroomCount"]
        classroom_count -> Nullable<Integer>,
        #[sql_name = "TeacherCount"]
        teacher_count -> Nullable<Integer>,
        #[sql_name = "AdministrativeStaffCount"]
        administrative_staff_count -> Nullable<Integer>,
        #[sql_name = "ComputerCount"]
        computer_count -> Nullable<Integer>,
        #[sql_name = "HasSportsHall"]
        has_sports_hall -> Nullable<Bool>,
        #[sql_name = "HasDiningRoom"]
        has_dining_room -> Nullable<Bool>,
        #[sql_name = "HasLibrary"]
        has_library -> Nullable<Bool>,
        #[sql_name = "TotalArea"]
        total_area -> Nullable<Double>,
        #[sql_name = "Specialization"]
        specialization -> Nullable<Text>,
        #[sql_name = "EducationalPrograms"]
        educational_programs -> Nullable<Text>,
        #[sql_name = "Infrastructure"]
        infrastructure -> Nullable<Text>,
    }
}

diesel::joinable!(districts -> regions (region_id));
diesel::joinable!(institutions -> districts (district_id));

diesel::allow_tables_to_appear_in_same_query!(regions, districts, institutions);
