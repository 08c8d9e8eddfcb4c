pub mod csv_import_pipeline;
