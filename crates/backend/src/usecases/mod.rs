pub mod u508_import_products_excel;
